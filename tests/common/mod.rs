//! Shared fixtures for the integration tests.
//!
//! A single `MockServer` plays every OpenStack service: the identity
//! endpoint lives under `/v3`, and every catalog entry points back at the
//! same origin so that service path prefixes keep requests apart.

#![allow(dead_code)]

use cloud_portal::openstack::{default_services, AuthParams, Connection};
use cloud_portal::{ApiUrl, ConnectionConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token issued by the mocked identity service.
pub const TOKEN: &str = "gAAAAABtest-token";

/// Project the scoped token is bound to.
pub const PROJECT_ID: &str = "0a1b2c3d";

/// Builds a Keystone v3 token body whose catalog points at `uri`.
pub fn token_body(uri: &str, project_id: Option<&str>) -> Value {
    let catalog = json!([
        {
            "type": "compute",
            "name": "nova",
            "endpoints": [
                {"interface": "internal", "url": "http://10.0.0.10:8774/v2.1"},
                {"interface": "public", "url": format!("{uri}/v2.1")}
            ]
        },
        {
            "type": "image",
            "name": "glance",
            "endpoints": [{"interface": "public", "url": uri}]
        },
        {
            "type": "orchestration",
            "name": "heat",
            "endpoints": [{"interface": "public", "url": format!("{uri}/v1/{}", project_id.unwrap_or("none"))}]
        }
    ]);

    let mut token = json!({
        "methods": ["password"],
        "user": {"id": "u-1", "name": "jbloggs", "domain": {"id": "default", "name": "Default"}},
        "expires_at": "2099-01-01T00:00:00.000000Z",
        "catalog": catalog
    });
    if let Some(project_id) = project_id {
        token["project"] = json!({"id": project_id, "name": "demo"});
    }
    json!({ "token": token })
}

/// Builds a configuration pointing at the mock identity endpoint.
pub fn config(server: &MockServer) -> ConnectionConfig {
    ConnectionConfig::builder()
        .auth_url(ApiUrl::new(format!("{}/v3", server.uri())).unwrap())
        .services(default_services())
        .build()
        .unwrap()
}

/// Password credentials scoped to [`PROJECT_ID`].
pub fn password_params() -> AuthParams {
    AuthParams::new()
        .use_password("Default", "jbloggs", "secret")
        .use_project_id(PROJECT_ID)
}

/// Mounts a token endpoint that accepts any credentials.
pub async fn mount_identity(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", TOKEN)
                .set_body_json(token_body(&server.uri(), Some(PROJECT_ID))),
        )
        .mount(server)
        .await;
}

/// Mounts the identity endpoint and connects to it.
pub async fn connect(server: &MockServer) -> Connection {
    mount_identity(server).await;
    Connection::connect(config(server), password_params())
        .await
        .unwrap()
}
