//! Static descriptions of where a resource lives and how it is wrapped.
//!
//! Resource options are `const` values attached to each resource type. Keys
//! that are not set explicitly are derived from the endpoint:
//!
//! | option              | derived from `/flavors` |
//! |---------------------|-------------------------|
//! | list key            | `flavors`               |
//! | links key           | `flavors_links`         |
//! | single-resource key | `flavor`                |
//!
//! The single-resource key simply drops the last character of the list key.
//! Endpoints whose plural is not formed with a trailing `s` must set it
//! explicitly with [`ResourceOptions::with_resource_key`].

use crate::clients::HttpMethod;

/// How a single entity is wrapped in request and response bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeKey {
    /// Derive the key from the endpoint.
    Derived,
    /// Use the given key.
    Named(&'static str),
    /// The entity is the whole body.
    Unwrapped,
}

/// Declarative description of a managed resource.
///
/// # Example
///
/// ```rust
/// use cloud_portal::rest::ResourceOptions;
///
/// const FLAVORS: ResourceOptions = ResourceOptions::new("/flavors").with_detail();
///
/// assert_eq!(FLAVORS.list_key(), "flavors");
/// assert_eq!(FLAVORS.links_key(), "flavors_links");
/// assert_eq!(FLAVORS.resource_key().as_deref(), Some("flavor"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceOptions {
    endpoint: &'static str,
    resource_key: EnvelopeKey,
    list_key: Option<&'static str>,
    links_key: Option<&'static str>,
    primary_key_field: &'static str,
    update_verb: HttpMethod,
    detail: bool,
}

impl ResourceOptions {
    /// Creates options for the given endpoint with every key derived.
    #[must_use]
    pub const fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            resource_key: EnvelopeKey::Derived,
            list_key: None,
            links_key: None,
            primary_key_field: "id",
            update_verb: HttpMethod::Put,
            detail: false,
        }
    }

    /// Sets the key wrapping a single entity.
    #[must_use]
    pub const fn with_resource_key(mut self, key: &'static str) -> Self {
        self.resource_key = EnvelopeKey::Named(key);
        self
    }

    /// Declares that single entities are not wrapped.
    #[must_use]
    pub const fn unwrapped(mut self) -> Self {
        self.resource_key = EnvelopeKey::Unwrapped;
        self
    }

    /// Sets the key holding the entities of a list page.
    #[must_use]
    pub const fn with_list_key(mut self, key: &'static str) -> Self {
        self.list_key = Some(key);
        self
    }

    /// Sets the key holding pagination links.
    #[must_use]
    pub const fn with_links_key(mut self, key: &'static str) -> Self {
        self.links_key = Some(key);
        self
    }

    /// Sets the attribute used as the instance key in URLs.
    #[must_use]
    pub const fn with_primary_key(mut self, field: &'static str) -> Self {
        self.primary_key_field = field;
        self
    }

    /// Sets the HTTP verb used for updates.
    #[must_use]
    pub const fn with_update_verb(mut self, verb: HttpMethod) -> Self {
        self.update_verb = verb;
        self
    }

    /// Declares that full listings are served from `<endpoint>/detail`.
    #[must_use]
    pub const fn with_detail(mut self) -> Self {
        self.detail = true;
        self
    }

    /// Returns the endpoint path, relative to the service prefix.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    /// Returns the attribute used as the instance key.
    #[must_use]
    pub const fn primary_key_field(&self) -> &'static str {
        self.primary_key_field
    }

    /// Returns the HTTP verb used for updates.
    #[must_use]
    pub const fn update_verb(&self) -> HttpMethod {
        self.update_verb
    }

    /// Returns `true` if full listings use `<endpoint>/detail`.
    #[must_use]
    pub const fn has_detail(&self) -> bool {
        self.detail
    }

    /// Returns the key holding the entities of a list page.
    #[must_use]
    pub fn list_key(&self) -> &'static str {
        self.list_key
            .unwrap_or_else(|| self.endpoint.trim_matches('/'))
    }

    /// Returns the key holding pagination links.
    #[must_use]
    pub fn links_key(&self) -> String {
        self.links_key
            .map_or_else(|| format!("{}_links", self.list_key()), String::from)
    }

    /// Returns the key wrapping a single entity, or `None` when unwrapped.
    #[must_use]
    pub fn resource_key(&self) -> Option<String> {
        match self.resource_key {
            EnvelopeKey::Derived => {
                let list_key = self.list_key();
                let mut chars = list_key.chars();
                chars.next_back();
                Some(chars.as_str().to_string())
            }
            EnvelopeKey::Named(key) => Some(key.to_string()),
            EnvelopeKey::Unwrapped => None,
        }
    }
}

/// Declarative description of an unmanaged endpoint.
///
/// Unmanaged endpoints return one document that has no identity of its own.
/// By default the document is wrapped under the endpoint name with slashes
/// trimmed, so `/limits` yields `{"limits": {...}}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnmanagedOptions {
    endpoint: &'static str,
    resource_key: EnvelopeKey,
}

impl UnmanagedOptions {
    /// Creates options for the given endpoint with the key derived.
    #[must_use]
    pub const fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            resource_key: EnvelopeKey::Derived,
        }
    }

    /// Sets the key wrapping the document.
    #[must_use]
    pub const fn with_resource_key(mut self, key: &'static str) -> Self {
        self.resource_key = EnvelopeKey::Named(key);
        self
    }

    /// Declares that the document is the whole body.
    #[must_use]
    pub const fn unwrapped(mut self) -> Self {
        self.resource_key = EnvelopeKey::Unwrapped;
        self
    }

    /// Returns the endpoint path.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    /// Returns the key wrapping the document, or `None` when unwrapped.
    #[must_use]
    pub fn resource_key(&self) -> Option<String> {
        match self.resource_key {
            EnvelopeKey::Derived => Some(self.endpoint.trim_matches('/').to_string()),
            EnvelopeKey::Named(key) => Some(key.to_string()),
            EnvelopeKey::Unwrapped => None,
        }
    }
}
