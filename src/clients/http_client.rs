//! The shared HTTP transport.
//!
//! One [`HttpClient`] is created per connection and shared (via `Arc`) by every
//! service bound from it. Authentication is delegated to an [`Authenticator`]
//! hook that decorates each outgoing request.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::clients::error_message::extract_error_message;
use crate::clients::errors::{HttpError, HttpResponseError};
use crate::clients::http_request::{HttpRequest, JSON_CONTENT_TYPE};
use crate::clients::http_response::HttpResponse;
use crate::config::{ConnectionConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying the identity token on authenticated requests.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Hook that decorates every outgoing request with credentials.
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Adds credentials to a request about to be sent.
    fn authenticate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

/// Token authentication via the `X-Auth-Token` header.
///
/// The token slot starts empty and is filled once the handshake succeeds;
/// until then requests are sent without the header.
#[derive(Default)]
pub struct TokenAuth {
    token: RwLock<Option<String>>,
}

impl TokenAuth {
    /// Creates an authenticator with an empty token slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the token to attach to subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    /// Returns `true` once a token has been stored.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.has_token() { "*****" } else { "<none>" };
        f.debug_struct("TokenAuth").field("token", &state).finish()
    }
}

impl Authenticator for TokenAuth {
    fn authenticate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match token.as_deref() {
            Some(token) => request.header(AUTH_TOKEN_HEADER, token),
            None => request,
        }
    }
}

/// HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// Creates a basic-auth hook for the given credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"*****")
            .finish()
    }
}

impl Authenticator for BasicAuth {
    fn authenticate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

/// Transport-level settings.
#[derive(Clone, Debug)]
pub struct ClientSettings {
    /// Whether TLS certificates are verified.
    pub verify: bool,
    /// Overall request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Optional `User-Agent` prefix.
    pub user_agent_prefix: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            verify: true,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent_prefix: None,
        }
    }
}

impl From<&ConnectionConfig> for ClientSettings {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            verify: config.verify(),
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            user_agent_prefix: config.user_agent_prefix().map(String::from),
        }
    }
}

/// HTTP client shared by a connection and all of its services.
///
/// The client handles:
/// - Default headers (`User-Agent`, `Accept`)
/// - Credentials via its [`Authenticator`]
/// - Error message extraction for non-2xx responses
/// - Explicit release via [`close`](Self::close)
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use cloud_portal::clients::{ClientSettings, HttpClient, HttpMethod, HttpRequest, TokenAuth};
///
/// let client = HttpClient::new(&ClientSettings::default(), Arc::new(TokenAuth::new()))?;
/// let request = HttpRequest::builder(HttpMethod::Get, "http://localhost:8774/v2.1/flavors").build()?;
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: RwLock<Option<reqwest::Client>>,
    default_headers: HashMap<String, String>,
    authenticator: Arc<dyn Authenticator>,
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new transport.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Build`] if the reqwest client cannot be created
    /// (for example on TLS initialization failure).
    pub fn new(
        settings: &ClientSettings,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self, HttpError> {
        let user_agent_prefix = settings
            .user_agent_prefix
            .as_deref()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}Cloud Portal API Library v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        if !settings.verify {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(!settings.verify)
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client: RwLock::new(Some(client)),
            default_headers,
            authenticator,
        })
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Releases the transport and its connection pool.
    ///
    /// Every later request fails with [`HttpError::Closed`]; requests already
    /// in flight run to completion.
    pub fn close(&self) {
        let released = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            tracing::debug!("HTTP transport closed");
        }
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn live_client(&self) -> Option<reqwest::Client> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sends a request and waits for the full response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - The transport has been closed (`Closed`)
    /// - Request validation fails (`InvalidRequest`)
    /// - A network error occurs (`Network`)
    /// - A non-2xx response is received (`Response`), with the message
    ///   extracted from the body
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let client = self.live_client().ok_or(HttpError::Closed)?;
        request.verify()?;

        let mut req_builder = client.request(request.http_method.into(), &request.url);
        for (key, value) in &self.default_headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }
        if let Some(body) = &request.body {
            req_builder = req_builder
                .header("Content-Type", JSON_CONTENT_TYPE)
                .body(body.to_string());
        }
        req_builder = self.authenticator.authenticate(req_builder);

        tracing::debug!(method = %request.http_method, url = %request.url, "sending request");
        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let text = res.text().await?;
        tracing::debug!(status = code, url = %request.url, "received response");

        let response = HttpResponse::new(code, res_headers, text);
        if response.is_ok() {
            return Ok(response);
        }

        Err(HttpError::Response(HttpResponseError {
            code,
            message: extract_error_message(&response.text),
            body: response.text,
        }))
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}
