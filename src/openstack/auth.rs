//! Authentication request parameters for the identity service.

use std::fmt;

use serde_json::{json, Map, Value};

const MASK: &str = "*****";

/// Immutable builder for the body of an authentication request.
///
/// Each method returns a new value with one top-level key replaced
/// (`identity` or `scope`); every other key is preserved. No validation is
/// performed: an incoherent combination is sent as-is and rejected, if at
/// all, by the identity service.
///
/// # Example
///
/// ```rust
/// use cloud_portal::openstack::AuthParams;
/// use serde_json::json;
///
/// let params = AuthParams::new()
///     .use_password("Default", "jbloggs", "secret")
///     .use_project_id("p-123");
///
/// let dict = params.as_dict();
/// assert_eq!(dict["identity"]["methods"], json!(["password"]));
/// assert_eq!(dict["scope"]["project"]["id"], "p-123");
///
/// // Switching to a token keeps the scope.
/// let dict = params.use_token("tok").as_dict();
/// assert_eq!(dict["identity"]["token"]["id"], "tok");
/// assert_eq!(dict["scope"]["project"]["id"], "p-123");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthParams {
    params: Map<String, Value>,
}

impl AuthParams {
    /// Creates empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with(&self, key: &str, value: Value) -> Self {
        let mut params = self.params.clone();
        params.insert(key.to_string(), value);
        Self { params }
    }

    /// Authenticates with an existing token.
    #[must_use]
    pub fn use_token(&self, token: &str) -> Self {
        self.with(
            "identity",
            json!({
                "methods": ["token"],
                "token": {"id": token},
            }),
        )
    }

    /// Authenticates with a username and password in the given domain.
    #[must_use]
    pub fn use_password(&self, domain: &str, username: &str, password: &str) -> Self {
        self.with(
            "identity",
            json!({
                "methods": ["password"],
                "password": {
                    "user": {
                        "domain": {"name": domain},
                        "name": username,
                        "password": password,
                    },
                },
            }),
        )
    }

    /// Scopes the resulting token to a project.
    #[must_use]
    pub fn use_project_id(&self, project_id: &str) -> Self {
        self.with("scope", json!({"project": {"id": project_id}}))
    }

    /// Returns the accumulated parameters, ready to be wrapped under `auth`.
    #[must_use]
    pub fn as_dict(&self) -> Value {
        Value::Object(self.params.clone())
    }
}

impl fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut masked = self.as_dict();
        mask_secrets(&mut masked, None);
        f.debug_tuple("AuthParams").field(&masked).finish()
    }
}

fn mask_secrets(value: &mut Value, parent: Option<&str>) {
    if let Value::Object(map) = value {
        for (key, child) in map.iter_mut() {
            let secret = (key == "password" && child.is_string())
                || (parent == Some("token") && key == "id");
            if secret {
                *child = Value::String(MASK.to_string());
            } else {
                mask_secrets(child, Some(key.as_str()));
            }
        }
    }
}
