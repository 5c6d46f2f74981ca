//! HTTP-specific error types.
//!
//! - [`HttpResponseError`]: a non-2xx response from an API
//! - [`InvalidHttpRequestError`]: a request that failed validation before sending
//! - [`HttpError`]: unified error type for everything the transport can report
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_portal::clients::HttpError;
//!
//! match client.request(request).await {
//!     Ok(response) => println!("Success: {}", response.body),
//!     Err(HttpError::Response(e)) => println!("API error {}: {}", e.code, e.message),
//!     Err(HttpError::Closed) => println!("connection already closed"),
//!     Err(e) => println!("transport failure: {e}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when a request receives a non-successful response.
///
/// `message` is the human-readable message extracted from the body with
/// [`extract_error_message`](crate::clients::extract_error_message); `body`
/// keeps the raw response text.
///
/// # Example
///
/// ```rust
/// use cloud_portal::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     code: 404,
///     message: "Flavor 42 could not be found.".to_string(),
///     body: r#"{"itemNotFound": {"message": "Flavor 42 could not be found.", "code": 404}}"#.to_string(),
/// };
///
/// assert_eq!(error.to_string(), "Flavor 42 could not be found.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Message extracted from the response body.
    pub message: String,
    /// The raw response body.
    pub body: String,
}

/// Error returned when a request fails validation before it is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// The request URL is not absolute.
    #[error("Invalid request URL '{url}'.")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },
}

/// Unified error type for all HTTP-related errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The underlying reqwest client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(reqwest::Error),

    /// The transport was released with `close()`.
    #[error("The connection has been closed.")]
    Closed,
}

impl HttpError {
    /// Returns the HTTP status code for API errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            _ => None,
        }
    }
}
