//! The HTTP transport layer.
//!
//! # Overview
//!
//! - [`HttpClient`]: the async transport shared by a connection and its services
//! - [`Authenticator`]: request decoration hook ([`TokenAuth`], [`BasicAuth`])
//! - [`HttpRequest`] / [`HttpResponse`]: request and response values
//! - [`HttpMethod`]: supported HTTP methods
//! - [`extract_error_message`]: best-effort message search over error bodies
//!
//! Every non-2xx response becomes [`HttpError::Response`] carrying the status
//! code and the extracted message. The transport never retries.

mod error_message;
mod errors;
mod http_client;
mod http_request;
mod http_response;

pub use error_message::{extract_error_message, find_message};
pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_client::{
    Authenticator, BasicAuth, ClientSettings, HttpClient, TokenAuth, AUTH_TOKEN_HEADER,
    SDK_VERSION,
};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder, JSON_CONTENT_TYPE};
pub use http_response::HttpResponse;
