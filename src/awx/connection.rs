//! Connections to an AWX server.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::{BasicAuth, ClientSettings, HttpClient};
use crate::config::{ApiUrl, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use crate::error::ConfigError;
use crate::rest::{ResourceError, ResourceManager, Service, ServiceHandle, ServiceResolver};

use super::resources::{
    Credential, CredentialType, Inventory, Job, JobEvent, JobTemplate, Organisation, Role, Team,
};

/// Accessor name and catalog type of the single AWX service.
pub const AWX: &str = "awx";

/// Path prefix of the AWX API.
pub const AWX_PATH_PREFIX: &str = "/api/v2";

/// Settings for an [`AwxConnection`].
///
/// # Example
///
/// ```rust
/// use cloud_portal::ApiUrl;
/// use cloud_portal::awx::AwxConfig;
///
/// let config = AwxConfig::builder()
///     .url(ApiUrl::new("https://awx.example.com").unwrap())
///     .username("admin")
///     .password("secret")
///     .build()
///     .unwrap();
///
/// assert!(config.verify());
/// assert!(!format!("{config:?}").contains("secret"));
/// ```
#[derive(Clone)]
pub struct AwxConfig {
    url: ApiUrl,
    username: String,
    password: String,
    verify: bool,
    timeout: Duration,
    connect_timeout: Duration,
}

impl AwxConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AwxConfigBuilder {
        AwxConfigBuilder::default()
    }

    /// Returns the server URL.
    #[must_use]
    pub const fn url(&self) -> &ApiUrl {
        &self.url
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns whether TLS certificates are verified.
    #[must_use]
    pub const fn verify(&self) -> bool {
        self.verify
    }

    /// Returns the overall request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            verify: self.verify,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent_prefix: None,
        }
    }
}

impl fmt::Debug for AwxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwxConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"*****")
            .field("verify", &self.verify)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AwxConfig`].
///
/// `url`, `username` and `password` are required.
#[derive(Default)]
pub struct AwxConfigBuilder {
    url: Option<ApiUrl>,
    username: Option<String>,
    password: Option<String>,
    verify: Option<bool>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl AwxConfigBuilder {
    /// Sets the server URL (required).
    #[must_use]
    pub fn url(mut self, url: ApiUrl) -> Self {
        self.url = Some(url);
        self
    }

    /// Sets the username (required).
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password (required).
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    /// Sets the overall request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the [`AwxConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if a required field is not set.
    pub fn build(self) -> Result<AwxConfig, ConfigError> {
        Ok(AwxConfig {
            url: self
                .url
                .ok_or(ConfigError::MissingRequiredField { field: "url" })?,
            username: self
                .username
                .ok_or(ConfigError::MissingRequiredField { field: "username" })?,
            password: self
                .password
                .ok_or(ConfigError::MissingRequiredField { field: "password" })?,
            verify: self.verify.unwrap_or(true),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        })
    }
}

impl fmt::Debug for AwxConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwxConfigBuilder")
            .field("url", &self.url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A connection to an AWX server using HTTP basic authentication.
///
/// There is no handshake: credentials are sent with every request and a bad
/// password surfaces as a 401 on the first call.
///
/// # Example
///
/// ```rust,ignore
/// use cloud_portal::awx::AwxConnection;
///
/// let awx = AwxConnection::new(config)?;
/// let template = awx.job_templates().get("7").await?;
/// let job = awx.job_templates().launch(&template).await?;
/// let mut events = awx.jobs().job_events(&job).all();
/// while let Some(event) = events.next().await? {
///     println!("{}", event.event);
/// }
/// ```
#[derive(Clone)]
pub struct AwxConnection {
    inner: Arc<AwxInner>,
}

struct AwxInner {
    config: AwxConfig,
    service: Arc<Service>,
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AwxConnection>();
};

impl AwxConnection {
    /// Creates a connection.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the transport cannot be built.
    pub fn new(config: AwxConfig) -> Result<Self, ResourceError> {
        let auth = Arc::new(BasicAuth::new(config.username.as_str(), config.password.as_str()));
        let client = Arc::new(HttpClient::new(&config.client_settings(), auth)?);
        let service = Arc::new(Service::new(
            AWX,
            AWX,
            config.url.as_str(),
            AWX_PATH_PREFIX,
            client,
        ));
        tracing::debug!(url = %service.api_url(), username = %config.username, "created AWX connection");

        Ok(Self {
            inner: Arc::new(AwxInner { config, service }),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AwxConfig {
        &self.inner.config
    }

    /// Returns the bound service.
    #[must_use]
    pub fn service(&self) -> &Arc<Service> {
        &self.inner.service
    }

    /// Returns a handle exposing the root managers.
    #[must_use]
    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle::new(Arc::clone(&self.inner.service), self.resolver())
    }

    /// Returns this connection as a resolver for relations.
    #[must_use]
    pub fn resolver(&self) -> Arc<dyn ServiceResolver> {
        self.inner.clone()
    }

    /// Releases the transport.
    pub fn close(&self) {
        self.inner.service.client().close();
    }

    /// Returns the organisation manager.
    #[must_use]
    pub fn organisations(&self) -> ResourceManager<Organisation> {
        self.handle().root()
    }

    /// Returns the credential type manager.
    #[must_use]
    pub fn credential_types(&self) -> ResourceManager<CredentialType> {
        self.handle().root()
    }

    /// Returns the credential manager.
    #[must_use]
    pub fn credentials(&self) -> ResourceManager<Credential> {
        self.handle().root()
    }

    /// Returns the team manager.
    #[must_use]
    pub fn teams(&self) -> ResourceManager<Team> {
        self.handle().root()
    }

    /// Returns the job template manager.
    #[must_use]
    pub fn job_templates(&self) -> ResourceManager<JobTemplate> {
        self.handle().root()
    }

    /// Returns the job manager.
    #[must_use]
    pub fn jobs(&self) -> ResourceManager<Job> {
        self.handle().root()
    }

    /// Returns the inventory manager.
    #[must_use]
    pub fn inventories(&self) -> ResourceManager<Inventory> {
        self.handle().root()
    }

    /// Returns the role manager.
    #[must_use]
    pub fn roles(&self) -> ResourceManager<Role> {
        self.handle().root()
    }

    /// Returns the job event manager.
    #[must_use]
    pub fn job_events(&self) -> ResourceManager<JobEvent> {
        self.handle().root()
    }
}

impl fmt::Debug for AwxConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwxConnection")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ServiceResolver for AwxInner {
    fn resolve(&self, name: &str) -> Result<Arc<Service>, ResourceError> {
        if name == AWX {
            Ok(Arc::clone(&self.service))
        } else {
            Err(ResourceError::UnknownService {
                name: name.to_string(),
            })
        }
    }
}
