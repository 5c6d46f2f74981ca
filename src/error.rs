//! Error types for crate configuration.
//!
//! All configuration constructors return `Result<T, ConfigError>` so that a
//! bad auth URL or interface is rejected before any request is made.
//!
//! # Example
//!
//! ```rust
//! use cloud_portal::{ApiUrl, ConfigError};
//!
//! let result = ApiUrl::new("");
//! assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while building connection configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An endpoint URL is malformed.
    #[error("Invalid URL '{url}'. Expected an absolute URL with scheme and host (e.g., 'https://keystone.example.com:5000/v3').")]
    InvalidUrl {
        /// The URL that was provided.
        url: String,
    },

    /// The endpoint interface name is empty.
    #[error("Endpoint interface cannot be empty. Use 'public', 'internal' or 'admin'.")]
    EmptyInterface,

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// The same service accessor name was registered twice.
    #[error("Service '{name}' is registered more than once.")]
    DuplicateService {
        /// The duplicated accessor name.
        name: String,
    },
}
