//! Service descriptors, bound services and cross-service resolution.
//!
//! A [`ServiceDescriptor`] is registered on the connection configuration and
//! names a catalog type plus a path prefix. When a service is first accessed
//! it is bound to the endpoint advertised for its catalog type, producing a
//! [`Service`] that shares the connection's transport.

use std::fmt;
use std::sync::Arc;

use crate::clients::HttpClient;
use crate::rest::{Resource, ResourceError, ResourceManager, UnmanagedEndpoint, UnmanagedResource};

/// Returns the accessor name for a catalog type (`key-manager` → `key_manager`).
#[must_use]
pub fn service_name(catalog_type: &str) -> String {
    catalog_type.replace('-', "_")
}

/// Registration of a service type on a connection.
///
/// # Example
///
/// ```rust
/// use cloud_portal::rest::ServiceDescriptor;
///
/// let service = ServiceDescriptor::new("orchestration", "/v1/{project_id}");
/// assert_eq!(service.name(), "orchestration");
///
/// let service = ServiceDescriptor::new("key-manager", "/v1");
/// assert_eq!(service.name(), "key_manager");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
    catalog_type: String,
    name: String,
    path_prefix: String,
}

impl ServiceDescriptor {
    /// Creates a descriptor named after its catalog type.
    ///
    /// `path_prefix` may contain a `{project_id}` placeholder.
    #[must_use]
    pub fn new(catalog_type: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        let catalog_type = catalog_type.into();
        Self {
            name: service_name(&catalog_type),
            catalog_type,
            path_prefix: path_prefix.into(),
        }
    }

    /// Overrides the accessor name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the catalog type.
    #[must_use]
    pub fn catalog_type(&self) -> &str {
        &self.catalog_type
    }

    /// Returns the accessor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the uninterpolated path prefix.
    #[must_use]
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Binds the descriptor to a base URL.
    ///
    /// `{project_id}` in the prefix is replaced with the scoped project, or
    /// with an empty string for unscoped connections.
    #[must_use]
    pub fn bind(
        &self,
        base_url: impl Into<String>,
        project_id: Option<&str>,
        client: Arc<HttpClient>,
    ) -> Service {
        let path_prefix = self
            .path_prefix
            .replace("{project_id}", project_id.unwrap_or_default());
        Service::new(
            self.name.clone(),
            self.catalog_type.clone(),
            base_url,
            path_prefix,
            client,
        )
    }
}

/// A service bound to a concrete endpoint.
#[derive(Clone)]
pub struct Service {
    name: String,
    catalog_type: String,
    base_url: String,
    path_prefix: String,
    client: Arc<HttpClient>,
}

impl Service {
    /// Creates a bound service.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        catalog_type: impl Into<String>,
        base_url: impl Into<String>,
        path_prefix: impl Into<String>,
        client: Arc<HttpClient>,
    ) -> Self {
        Self {
            name: name.into(),
            catalog_type: catalog_type.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            path_prefix: path_prefix.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the accessor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the catalog type.
    #[must_use]
    pub fn catalog_type(&self) -> &str {
        &self.catalog_type
    }

    /// Returns the base URL (`scheme://host[:port]` for catalog services).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the interpolated path prefix.
    #[must_use]
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Returns the base URL joined with the path prefix.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url, self.path_prefix)
    }

    /// Returns the shared transport.
    #[must_use]
    pub const fn client(&self) -> &Arc<HttpClient> {
        &self.client
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("catalog_type", &self.catalog_type)
            .field("base_url", &self.base_url)
            .field("path_prefix", &self.path_prefix)
            .finish_non_exhaustive()
    }
}

/// Looks up bound services by accessor name.
///
/// Implemented by connections; resource managers use it to reach the
/// service that owns a related resource.
pub trait ServiceResolver: Send + Sync {
    /// Returns the service registered under `name`, binding it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownService`] or
    /// [`ResourceError::ServiceUnavailable`] if the service cannot be bound.
    fn resolve(&self, name: &str) -> Result<Arc<Service>, ResourceError>;
}

/// A bound service together with the resolver for related resources.
///
/// This is what provider-specific service types wrap to expose their
/// resource managers.
#[derive(Clone)]
pub struct ServiceHandle {
    service: Arc<Service>,
    resolver: Arc<dyn ServiceResolver>,
}

impl ServiceHandle {
    /// Creates a handle.
    #[must_use]
    pub fn new(service: Arc<Service>, resolver: Arc<dyn ServiceResolver>) -> Self {
        Self { service, resolver }
    }

    /// Returns the bound service.
    #[must_use]
    pub const fn service(&self) -> &Arc<Service> {
        &self.service
    }

    /// Returns the resolver.
    #[must_use]
    pub const fn resolver(&self) -> &Arc<dyn ServiceResolver> {
        &self.resolver
    }

    /// Returns the root manager for a resource type.
    #[must_use]
    pub fn root<R: Resource>(&self) -> ResourceManager<R> {
        ResourceManager::new(Arc::clone(&self.service), Arc::clone(&self.resolver))
    }

    /// Returns an unmanaged endpoint at the root of the service.
    #[must_use]
    pub fn endpoint<U: UnmanagedResource>(&self) -> UnmanagedEndpoint<U> {
        UnmanagedEndpoint::new(Arc::clone(&self.service), String::new())
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}
