//! Error types for resource operations.
//!
//! API failures from the transport are wrapped unchanged in
//! [`ResourceError::Http`]; everything else describes a response or a
//! configuration the resource layer could not make sense of.
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_portal::rest::ResourceError;
//!
//! match compute.servers().get("abc").await {
//!     Ok(server) => println!("{:?}", server.status),
//!     Err(e) if e.status() == Some(404) => println!("gone"),
//!     Err(e) if e.is_fatal() => panic!("misconfigured client: {e}"),
//!     Err(e) => println!("request failed: {e}"),
//! }
//! ```

use crate::clients::HttpError;
use thiserror::Error;

/// Error type for resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The request failed at the transport or API level.
    ///
    /// Authentication failures during the handshake surface here as well,
    /// with the status code and message reported by the identity service.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// An expected envelope key was missing or had the wrong shape.
    #[error("Malformed {resource} response: missing or invalid '{key}'")]
    MalformedEnvelope {
        /// The resource being decoded.
        resource: &'static str,
        /// The envelope key or header that was expected.
        key: String,
    },

    /// An entity did not fit its typed model.
    #[error("Failed to decode {resource}: {message}")]
    Deserialize {
        /// The resource being decoded.
        resource: &'static str,
        /// The underlying serde error.
        message: String,
    },

    /// The service catalog has no endpoint for a registered service.
    #[error("No endpoint in the service catalog for service type '{catalog_type}'")]
    ServiceUnavailable {
        /// The catalog type that was looked up.
        catalog_type: String,
    },

    /// No service is registered under the requested accessor name.
    #[error("No service registered under the name '{name}'")]
    UnknownService {
        /// The accessor name that was requested.
        name: String,
    },

    /// The manager for a related resource could not be located.
    ///
    /// This indicates a misconfigured client rather than a runtime condition
    /// and is never worth retrying.
    #[error("Unable to locate manager for {resource} via service '{service}': {reason}")]
    RelationResolution {
        /// The related resource type.
        resource: &'static str,
        /// The service accessor name derived from the resource's catalog type.
        service: String,
        /// Why resolution failed.
        reason: String,
    },

    /// Write parameters were not a JSON object.
    #[error("Invalid parameters for {resource}: {message}")]
    InvalidParams {
        /// The resource being written.
        resource: &'static str,
        /// What was wrong with the parameters.
        message: String,
    },
}

impl ResourceError {
    /// Returns `true` for configuration defects that must not be retried.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::RelationResolution { .. })
    }

    /// Returns the HTTP status code if the error came from an API response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Returns the API message if the error came from an API response.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Http(HttpError::Response(e)) => Some(&e.message),
            _ => None,
        }
    }

    pub(crate) fn deserialize(resource: &'static str, error: &serde_json::Error) -> Self {
        Self::Deserialize {
            resource,
            message: error.to_string(),
        }
    }

    pub(crate) fn envelope(resource: &'static str, key: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            resource,
            key: key.into(),
        }
    }
}
