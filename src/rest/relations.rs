//! Relationship shapes between resources.
//!
//! - **Root**: a top-level collection, see [`ServiceHandle::root`](crate::rest::ServiceHandle::root)
//! - **Nested**: a collection under one instance, see
//!   [`ResourceManager::nested`](crate::rest::ResourceManager::nested)
//! - **Embedded**: a reference carried inside the parent's body, decoded
//!   eagerly as an [`Embedded<T>`] and fetched on demand, possibly from
//!   another service
//! - **Unmanaged**: a single document without identity, see [`UnmanagedEndpoint`]
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_portal::rest::Embedded;
//!
//! #[derive(Clone, Debug, Deserialize)]
//! pub struct Server {
//!     pub id: String,
//!     #[serde(default, deserialize_with = "cloud_portal::rest::optional_embedded")]
//!     pub image: Option<Embedded<Image>>,
//! }
//!
//! // `image` lives in the image service; the compute manager resolves it there.
//! let image = servers.fetch_embedded(server.image.as_ref().unwrap()).await?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::clients::{HttpError, HttpMethod, HttpRequest};
use crate::rest::resource::key_string;
use crate::rest::{
    related_manager, Entity, Resource, ResourceError, Service, ServiceResolver, UnmanagedResource,
};

/// A reference to another resource embedded in a parent's body.
///
/// The body may carry a full object, a partial object or just the primary
/// key. Whatever was present is kept (under attribute names) and the full
/// entity is fetched on demand through the manager of the service that owns
/// `T`.
pub struct Embedded<T> {
    key: Option<String>,
    data: Map<String, Value>,
    _resource: PhantomData<fn() -> T>,
}

impl<T> Clone for Embedded<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: self.data.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Embedded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedded")
            .field("key", &self.key)
            .field("data", &self.data)
            .finish()
    }
}

impl<T: Resource> Embedded<T> {
    /// Builds an embedded reference from its wire value.
    ///
    /// # Errors
    ///
    /// Returns a message if the value is neither an object nor a scalar key.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let primary_key = T::OPTIONS.primary_key_field();
        let data = match value {
            Value::Object(wire) => T::FIELDS.attributes_from(wire),
            scalar @ (Value::String(_) | Value::Number(_)) => {
                let mut data = Map::new();
                data.insert(primary_key.to_string(), scalar);
                data
            }
            other => {
                return Err(format!(
                    "expected an object or a key for embedded {}, found {other}",
                    T::NAME
                ))
            }
        };

        Ok(Self {
            key: data.get(primary_key).and_then(key_string),
            data,
            _resource: PhantomData,
        })
    }

    /// Returns the primary key of the referenced entity, if it was embedded.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns the embedded attributes.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns one embedded attribute.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.data.get(attribute)
    }

    /// Decodes the embedded attributes as a (possibly partial) `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Deserialize`] if required attributes are missing.
    pub fn partial(&self) -> Result<T, ResourceError> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| ResourceError::deserialize(T::NAME, &e))
    }

    /// Fetches the full entity through the manager of the owning service.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MalformedEnvelope`] if no key was embedded,
    /// [`ResourceError::RelationResolution`] if the owning service cannot be
    /// located, or any error from the fetch itself.
    pub async fn fetch(&self, resolver: &Arc<dyn ServiceResolver>) -> Result<T, ResourceError> {
        let key = self
            .key()
            .ok_or_else(|| ResourceError::envelope(T::NAME, T::OPTIONS.primary_key_field()))?;
        related_manager::<T>(resolver)?.get(key).await
    }
}

impl<'de, T: Resource> Deserialize<'de> for Embedded<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// Deserializes an optional embedded reference.
///
/// `null`, an empty string and an empty object all mean "no reference".
///
/// # Errors
///
/// Fails if the value is present but cannot be decoded as an [`Embedded<T>`].
pub fn optional_embedded<'de, D, T>(deserializer: D) -> Result<Option<Embedded<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Resource,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        _ => Embedded::from_value(value).map(Some).map_err(de::Error::custom),
    }
}

/// Deserializes an inline entity, applying its field map.
///
/// Use this for embedded documents that have no identity of their own.
///
/// # Errors
///
/// Fails if the value does not decode as `T`.
pub fn inline_entity<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Entity,
{
    let value = Value::deserialize(deserializer)?;
    T::from_wire(value).map_err(de::Error::custom)
}

/// A single document served by an endpoint without identity.
pub struct UnmanagedEndpoint<U> {
    service: Arc<Service>,
    parent_path: String,
    _resource: PhantomData<fn() -> U>,
}

impl<U> Clone for UnmanagedEndpoint<U> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            parent_path: self.parent_path.clone(),
            _resource: PhantomData,
        }
    }
}

impl<U> fmt::Debug for UnmanagedEndpoint<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnmanagedEndpoint")
            .field("service", &self.service.name())
            .field("parent_path", &self.parent_path)
            .finish_non_exhaustive()
    }
}

impl<U: UnmanagedResource> UnmanagedEndpoint<U> {
    pub(crate) fn new(service: Arc<Service>, parent_path: String) -> Self {
        Self {
            service,
            parent_path,
            _resource: PhantomData,
        }
    }

    /// Returns the absolute URL of the document.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}{}{}",
            self.service.api_url(),
            self.parent_path,
            U::OPTIONS.endpoint()
        )
    }

    /// Fetches and decodes the document.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] for API failures and
    /// [`ResourceError::MalformedEnvelope`] if the declared key is missing.
    pub async fn fetch(&self) -> Result<U, ResourceError> {
        let request = HttpRequest::builder(HttpMethod::Get, self.url())
            .build()
            .map_err(HttpError::from)?;
        let response = self.service.client().request(request).await?;

        let document = match U::OPTIONS.resource_key() {
            Some(key) => match response.body {
                Value::Object(mut envelope) => envelope
                    .remove(&key)
                    .ok_or_else(|| ResourceError::envelope(U::NAME, key))?,
                _ => return Err(ResourceError::envelope(U::NAME, key)),
            },
            None => response.body,
        };
        U::from_wire(document)
    }
}
