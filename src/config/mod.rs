//! Configuration types for connecting to a cloud identity endpoint.
//!
//! # Overview
//!
//! - [`ConnectionConfig`]: everything a [`Connection`](crate::openstack::Connection)
//!   needs besides the credentials themselves
//! - [`ConnectionConfigBuilder`]: fail-fast builder for [`ConnectionConfig`]
//! - [`ApiUrl`]: a validated absolute URL
//! - [`Interface`]: the catalog interface to select endpoints from
//!
//! # Example
//!
//! ```rust
//! use cloud_portal::{ApiUrl, ConnectionConfig};
//! use cloud_portal::openstack::default_services;
//!
//! let config = ConnectionConfig::builder()
//!     .auth_url(ApiUrl::new("https://keystone.example.com:5000/v3").unwrap())
//!     .services(default_services())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.interface().as_ref(), "public");
//! assert!(config.verify());
//! ```

mod newtypes;

pub use newtypes::{ApiUrl, Interface};
pub(crate) use newtypes::origin_of;

use std::collections::HashSet;
use std::time::Duration;

use crate::error::ConfigError;
use crate::rest::ServiceDescriptor;

/// Default overall request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by a connection and every connection scoped from it.
///
/// # Thread Safety
///
/// `ConnectionConfig` is `Clone`, `Send` and `Sync`.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    auth_url: ApiUrl,
    interface: Interface,
    verify: bool,
    timeout: Duration,
    connect_timeout: Duration,
    user_agent_prefix: Option<String>,
    services: Vec<ServiceDescriptor>,
}

impl ConnectionConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new()
    }

    /// Returns the identity endpoint URL.
    #[must_use]
    pub const fn auth_url(&self) -> &ApiUrl {
        &self.auth_url
    }

    /// Returns the catalog interface.
    #[must_use]
    pub const fn interface(&self) -> &Interface {
        &self.interface
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

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the registered service descriptors.
    #[must_use]
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Looks up a registered service by accessor name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name() == name)
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ConnectionConfig>();
};

/// Builder for [`ConnectionConfig`].
///
/// `auth_url` is required.
///
/// # Defaults
///
/// - `interface`: `public`
/// - `verify`: `true`
/// - `timeout`: 30 seconds
/// - `connect_timeout`: 10 seconds
/// - `services`: none
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    auth_url: Option<ApiUrl>,
    interface: Option<Interface>,
    verify: Option<bool>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
    services: Vec<ServiceDescriptor>,
}

impl ConnectionConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identity endpoint URL (required).
    #[must_use]
    pub fn auth_url(mut self, url: ApiUrl) -> Self {
        self.auth_url = Some(url);
        self
    }

    /// Sets the catalog interface.
    #[must_use]
    pub fn interface(mut self, interface: Interface) -> Self {
        self.interface = Some(interface);
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

    /// Sets a prefix for the `User-Agent` header.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Registers one service.
    #[must_use]
    pub fn service(mut self, service: ServiceDescriptor) -> Self {
        self.services.push(service);
        self
    }

    /// Registers several services.
    #[must_use]
    pub fn services(mut self, services: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        self.services.extend(services);
        self
    }

    /// Builds the [`ConnectionConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `auth_url` is not set
    /// and [`ConfigError::DuplicateService`] if two services share a name.
    pub fn build(self) -> Result<ConnectionConfig, ConfigError> {
        let auth_url = self
            .auth_url
            .ok_or(ConfigError::MissingRequiredField { field: "auth_url" })?;

        let mut seen = HashSet::new();
        for service in &self.services {
            if !seen.insert(service.name()) {
                return Err(ConfigError::DuplicateService {
                    name: service.name().to_string(),
                });
            }
        }

        Ok(ConnectionConfig {
            auth_url,
            interface: self.interface.unwrap_or_default(),
            verify: self.verify.unwrap_or(true),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent_prefix: self.user_agent_prefix,
            services: self.services,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_url() -> ApiUrl {
        ApiUrl::new("http://localhost:5000/v3").unwrap()
    }

    #[test]
    fn test_builder_requires_auth_url() {
        let result = ConnectionConfigBuilder::new().build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "auth_url" })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ConnectionConfig::builder().auth_url(auth_url()).build().unwrap();

        assert_eq!(config.interface().as_ref(), "public");
        assert!(config.verify());
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert!(config.user_agent_prefix().is_none());
        assert!(config.services().is_empty());
    }

    #[test]
    fn test_builder_rejects_duplicate_service_names() {
        let result = ConnectionConfig::builder()
            .auth_url(auth_url())
            .service(ServiceDescriptor::new("compute", "/v2.1"))
            .service(ServiceDescriptor::new("compute", "/v2"))
            .build();

        assert_eq!(
            result.unwrap_err(),
            ConfigError::DuplicateService {
                name: "compute".to_string()
            }
        );
    }

    #[test]
    fn test_service_lookup_uses_accessor_name() {
        let config = ConnectionConfig::builder()
            .auth_url(auth_url())
            .service(ServiceDescriptor::new("key-manager", "/v1"))
            .build()
            .unwrap();

        assert!(config.service("key_manager").is_some());
        assert!(config.service("key-manager").is_none());
    }
}
