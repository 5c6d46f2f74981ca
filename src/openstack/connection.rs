//! Authenticated connections to an OpenStack cloud.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::clients::{ClientSettings, HttpClient, HttpError, HttpMethod, HttpRequest, TokenAuth};
use crate::config::{origin_of, ApiUrl, ConnectionConfig, Interface};
use crate::openstack::compute::Compute;
use crate::openstack::identity::{Project, IDENTITY};
use crate::openstack::image::ImageService;
use crate::openstack::orchestration::Orchestration;
use crate::openstack::AuthParams;
use crate::rest::{IntoKey, ResourceError, ResourceManager, Service, ServiceHandle, ServiceResolver};

/// Response header carrying the issued token.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// An authenticated connection to an identity endpoint and its catalog.
///
/// A `Connection` exists only once authentication has succeeded; there is
/// no partially initialized state. Services are bound lazily on first access
/// and cached for the lifetime of the connection. Cloning is cheap and every
/// clone shares the transport, the token and the service cache.
///
/// # Example
///
/// ```rust,ignore
/// use cloud_portal::{ApiUrl, ConnectionConfig};
/// use cloud_portal::openstack::{default_services, AuthParams, Connection};
///
/// let config = ConnectionConfig::builder()
///     .auth_url(ApiUrl::new("https://keystone.example.com:5000/v3")?)
///     .services(default_services())
///     .build()?;
/// let params = AuthParams::new().use_password("Default", "jbloggs", "secret");
///
/// let conn = Connection::connect(config, params).await?;
/// let projects = conn.projects()?.all().try_collect().await?;
/// let scoped = conn.scoped_connection(&projects[0]).await?;
/// let flavors = scoped.compute()?.flavors().all().try_collect().await?;
/// scoped.close();
/// conn.close();
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    config: ConnectionConfig,
    params: AuthParams,
    client: Arc<HttpClient>,
    session: Session,
    services: Mutex<HashMap<String, Arc<Service>>>,
}

struct Session {
    token: String,
    username: String,
    project_id: Option<String>,
    endpoints: HashMap<String, String>,
    expires_at: Option<DateTime<Utc>>,
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Connection>();
};

impl Connection {
    /// Authenticates and parses the service catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] with the identity service's status and
    /// message if authentication is rejected, and
    /// [`ResourceError::MalformedEnvelope`] if the token response lacks the
    /// token header or the expected body fields. On any failure the transport
    /// is closed before returning.
    pub async fn connect(config: ConnectionConfig, params: AuthParams) -> Result<Self, ResourceError> {
        let auth = Arc::new(TokenAuth::new());
        let client = Arc::new(HttpClient::new(&ClientSettings::from(&config), auth.clone())?);

        let session = match authenticate(&config, &params, &client).await {
            Ok(session) => session,
            Err(e) => {
                client.close();
                return Err(e);
            }
        };
        auth.set_token(session.token.as_str());

        tracing::info!(
            auth_url = %config.auth_url(),
            username = %session.username,
            project_id = ?session.project_id,
            services = session.endpoints.len(),
            "authenticated"
        );

        Ok(Self {
            inner: Arc::new(ConnectionInner {
                config,
                params,
                client,
                session,
                services: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Re-authenticates with this connection's token, scoped to a project.
    ///
    /// The new connection is independent: it has its own transport and
    /// service cache, and inherits the configuration of this one.
    ///
    /// # Errors
    ///
    /// As [`connect`](Self::connect).
    pub async fn scoped_connection(&self, project: impl IntoKey) -> Result<Self, ResourceError> {
        let project_id = project.into_key();
        tracing::info!(project_id = %project_id, "scoping connection to project");
        let params = AuthParams::new()
            .use_token(self.token())
            .use_project_id(&project_id);
        Self::connect(self.inner.config.clone(), params).await
    }

    /// Returns the service registered under `name`, binding it on first access.
    ///
    /// `identity` is always available and points at the auth URL itself.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownService`] if no service is registered
    /// under `name` and [`ResourceError::ServiceUnavailable`] if the catalog
    /// has no endpoint for its type.
    pub fn service(&self, name: &str) -> Result<Arc<Service>, ResourceError> {
        self.inner.resolve(name)
    }

    /// Returns a handle exposing the root managers of a service.
    ///
    /// # Errors
    ///
    /// As [`service`](Self::service).
    pub fn handle(&self, name: &str) -> Result<ServiceHandle, ResourceError> {
        Ok(ServiceHandle::new(self.service(name)?, self.resolver()))
    }

    /// Returns the compute service.
    ///
    /// # Errors
    ///
    /// As [`service`](Self::service).
    pub fn compute(&self) -> Result<Compute, ResourceError> {
        self.handle("compute").map(Compute::new)
    }

    /// Returns the image service.
    ///
    /// # Errors
    ///
    /// As [`service`](Self::service).
    pub fn image(&self) -> Result<ImageService, ResourceError> {
        self.handle("image").map(ImageService::new)
    }

    /// Returns the orchestration service.
    ///
    /// # Errors
    ///
    /// As [`service`](Self::service).
    pub fn orchestration(&self) -> Result<Orchestration, ResourceError> {
        self.handle("orchestration").map(Orchestration::new)
    }

    /// Returns the manager for the projects available to the current user.
    ///
    /// # Errors
    ///
    /// As [`service`](Self::service).
    pub fn projects(&self) -> Result<ResourceManager<Project>, ResourceError> {
        Ok(self.handle(IDENTITY)?.root())
    }

    /// Returns this connection as a resolver for cross-service relations.
    #[must_use]
    pub fn resolver(&self) -> Arc<dyn ServiceResolver> {
        self.inner.clone()
    }

    /// Releases the transport shared by this connection and its services.
    ///
    /// Later requests through any of them fail with
    /// [`HttpError::Closed`](crate::clients::HttpError::Closed).
    pub fn close(&self) {
        self.inner.client.close();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.client.is_closed()
    }

    /// Returns the configuration this connection was created with.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Returns the identity endpoint URL.
    #[must_use]
    pub fn auth_url(&self) -> &ApiUrl {
        self.inner.config.auth_url()
    }

    /// Returns the catalog interface endpoints were selected from.
    #[must_use]
    pub fn interface(&self) -> &Interface {
        self.inner.config.interface()
    }

    /// Returns whether TLS certificates are verified.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.inner.config.verify()
    }

    /// Returns the parameters used to authenticate.
    #[must_use]
    pub fn params(&self) -> &AuthParams {
        &self.inner.params
    }

    /// Returns the issued token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.inner.session.token
    }

    /// Returns the authenticated user's name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.inner.session.username
    }

    /// Returns the scoped project id, or `None` for unscoped tokens.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.inner.session.project_id.as_deref()
    }

    /// Returns the catalog endpoints keyed by service type.
    ///
    /// Each value is `scheme://host[:port]` with the catalog path removed.
    #[must_use]
    pub fn endpoints(&self) -> &HashMap<String, String> {
        &self.inner.session.endpoints
    }

    /// Returns the token expiry, if the identity service reported one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner.session.expires_at
    }

    /// Returns `true` if the token has a known expiry in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|expiry| expiry <= Utc::now())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("auth_url", &self.auth_url().as_str())
            .field("interface", &self.interface().as_str())
            .field("username", &self.username())
            .field("project_id", &self.project_id())
            .field("token", &"*****")
            .finish_non_exhaustive()
    }
}

impl ConnectionInner {
    fn identity_service(&self) -> Service {
        let auth_url = self.config.auth_url();
        Service::new(
            IDENTITY,
            IDENTITY,
            auth_url.origin(),
            auth_url.path(),
            Arc::clone(&self.client),
        )
    }
}

impl ServiceResolver for ConnectionInner {
    fn resolve(&self, name: &str) -> Result<Arc<Service>, ResourceError> {
        let mut cache = self.services.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(service) = cache.get(name) {
            return Ok(Arc::clone(service));
        }

        let service = if let Some(descriptor) = self.config.service(name) {
            let base_url = self
                .session
                .endpoints
                .get(descriptor.catalog_type())
                .ok_or_else(|| ResourceError::ServiceUnavailable {
                    catalog_type: descriptor.catalog_type().to_string(),
                })?;
            descriptor.bind(
                base_url.as_str(),
                self.session.project_id.as_deref(),
                Arc::clone(&self.client),
            )
        } else if name == IDENTITY {
            self.identity_service()
        } else {
            return Err(ResourceError::UnknownService {
                name: name.to_string(),
            });
        };

        tracing::debug!(service = name, url = %service.api_url(), "bound service");
        let service = Arc::new(service);
        cache.insert(name.to_string(), Arc::clone(&service));
        Ok(service)
    }
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    user: TokenUser,
    #[serde(default)]
    project: Option<TokenProject>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
    #[serde(default)]
    expires_at: Option<String>,
}

#[derive(Deserialize)]
struct TokenUser {
    name: String,
}

#[derive(Deserialize)]
struct TokenProject {
    id: String,
}

#[derive(Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Deserialize)]
struct CatalogEndpoint {
    interface: String,
    url: String,
}

async fn authenticate(
    config: &ConnectionConfig,
    params: &AuthParams,
    client: &HttpClient,
) -> Result<Session, ResourceError> {
    let url = format!("{}/auth/tokens", config.auth_url());
    let request = HttpRequest::builder(HttpMethod::Post, url)
        .json(json!({ "auth": params.as_dict() }))
        .build()
        .map_err(HttpError::from)?;
    let response = client.request(request).await?;

    let token = response
        .header(SUBJECT_TOKEN_HEADER)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .ok_or_else(|| ResourceError::envelope("Token", SUBJECT_TOKEN_HEADER))?;

    let TokenEnvelope { token: body } = serde_json::from_value(response.body).map_err(|e| {
        tracing::debug!(error = %e, "token response did not match the expected shape");
        ResourceError::envelope("Token", "token")
    })?;

    Ok(Session {
        token,
        username: body.user.name,
        project_id: body.project.map(|project| project.id),
        endpoints: parse_catalog(body.catalog, config.interface()),
        expires_at: body.expires_at.as_deref().and_then(parse_timestamp),
    })
}

/// Selects one endpoint per catalog entry on the given interface.
fn parse_catalog(catalog: Vec<CatalogEntry>, interface: &Interface) -> HashMap<String, String> {
    let mut endpoints = HashMap::new();
    for entry in catalog {
        let Some(endpoint) = entry
            .endpoints
            .iter()
            .find(|endpoint| endpoint.interface == interface.as_str())
        else {
            tracing::debug!(
                service_type = %entry.service_type,
                interface = interface.as_str(),
                "catalog entry has no endpoint on interface, skipping"
            );
            continue;
        };

        match reqwest::Url::parse(&endpoint.url) {
            Ok(url) if url.has_host() => {
                endpoints.insert(entry.service_type, origin_of(&url));
            }
            _ => tracing::debug!(
                service_type = %entry.service_type,
                url = %endpoint.url,
                "catalog endpoint URL is not absolute, skipping"
            ),
        }
    }
    endpoints
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}
