//! Validated newtype wrappers for configuration values.
//!
//! These wrappers validate their contents on construction so that a
//! connection can never be built from a malformed URL or an empty
//! endpoint interface.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated absolute API URL.
///
/// The URL must parse, carry a scheme and a host. Trailing slashes are
/// removed so that paths can be appended with a single `/`.
///
/// # Example
///
/// ```rust
/// use cloud_portal::ApiUrl;
///
/// let url = ApiUrl::new("https://keystone.example.com:5000/v3/").unwrap();
/// assert_eq!(url.as_ref(), "https://keystone.example.com:5000/v3");
/// assert_eq!(url.origin(), "https://keystone.example.com:5000");
/// assert_eq!(url.path(), "/v3");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl {
    url: String,
    origin: String,
    path: String,
}

impl ApiUrl {
    /// Creates a new validated URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the value does not parse as an
    /// absolute URL with a host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/').to_string();

        let parsed = reqwest::Url::parse(&trimmed)
            .map_err(|_| ConfigError::InvalidUrl { url: url.clone() })?;
        if !parsed.has_host() {
            return Err(ConfigError::InvalidUrl { url });
        }

        Ok(Self {
            origin: origin_of(&parsed),
            path: parsed.path().trim_end_matches('/').to_string(),
            url: trimmed,
        })
    }

    /// Returns `scheme://host[:port]` with any path removed.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns the path component without a trailing slash (may be empty).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Strips path, query and fragment from a parsed URL.
pub(crate) fn origin_of(url: &reqwest::Url) -> String {
    let mut origin = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        origin.push(':');
        origin.push_str(&port.to_string());
    }
    origin
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// The service catalog interface to select endpoints from.
///
/// Catalog entries usually advertise `public`, `internal` and `admin`
/// endpoints; only the configured one is ever used.
///
/// # Example
///
/// ```rust
/// use cloud_portal::Interface;
///
/// assert_eq!(Interface::default().as_ref(), "public");
/// assert_eq!(Interface::new(" Internal ").unwrap().as_ref(), "internal");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Interface(String);

impl Interface {
    /// Creates a new validated interface name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyInterface`] if the name is blank.
    pub fn new(interface: impl Into<String>) -> Result<Self, ConfigError> {
        let interface = interface.into().trim().to_lowercase();
        if interface.is_empty() {
            return Err(ConfigError::EmptyInterface);
        }
        Ok(Self(interface))
    }

    /// Returns the interface name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Interface {
    fn default() -> Self {
        Self("public".to_string())
    }
}

impl AsRef<str> for Interface {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
