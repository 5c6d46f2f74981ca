//! Best-effort extraction of a human-readable message from an error body.
//!
//! Cloud APIs wrap their error messages in many different envelopes:
//!
//! ```json
//! {"error": {"message": "The request you have made requires authentication.", "code": 401}}
//! {"itemNotFound": {"message": "Flavor 42 could not be found.", "code": 404}}
//! {"detail": "Authentication credentials were not provided."}
//! ```
//!
//! [`extract_error_message`] searches the parsed document depth-first for a
//! string `message` property. Anything it cannot make sense of is returned
//! verbatim.

use serde_json::Value;

/// Extracts an error message from a raw response body.
///
/// - Non-JSON bodies are returned unchanged.
/// - A string `message` at the current object level wins over anything nested.
/// - Otherwise object values are searched in document order, then array
///   elements in order.
/// - If no non-empty string `message` is found, the raw body is returned.
///
/// # Example
///
/// ```rust
/// use cloud_portal::clients::extract_error_message;
///
/// let body = r#"{"error": {"message": "The request you have made requires authentication."}}"#;
/// assert_eq!(
///     extract_error_message(body),
///     "The request you have made requires authentication."
/// );
///
/// assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
/// ```
#[must_use]
pub fn extract_error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .as_ref()
        .and_then(find_message)
        .map_or_else(|| text.to_string(), ToString::to_string)
}

/// Searches a JSON value depth-first for a string `message` property.
///
/// Array elements are searched in order, so a list of error objects yields
/// the first one carrying a message.
#[must_use]
pub fn find_message(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(message)) = map.get("message") {
                if !message.is_empty() {
                    return Some(message);
                }
            }
            map.values().find_map(find_message)
        }
        Value::Array(items) => items.iter().find_map(find_message),
        _ => None,
    }
}
