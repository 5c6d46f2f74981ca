//! Integration tests for the AWX adapter.
//!
//! AWX uses basic authentication, trailing-slash endpoints, unwrapped
//! entities and `results`/`next` pagination with relative next links.

use cloud_portal::awx::{AwxConfig, AwxConnection};
use cloud_portal::ApiUrl;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `admin:secret`, base64 encoded.
const BASIC_CREDENTIALS: &str = "Basic YWRtaW46c2VjcmV0";

fn awx(server: &MockServer) -> AwxConnection {
    let config = AwxConfig::builder()
        .url(ApiUrl::new(server.uri()).unwrap())
        .username("admin")
        .password("secret")
        .build()
        .unwrap();
    AwxConnection::new(config).unwrap()
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_sends_basic_auth_and_follows_relative_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .and(query_param("page", "2"))
        .and(header("Authorization", BASIC_CREDENTIALS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "next": null,
            "previous": "/api/v2/organizations/?page=1",
            "results": [{"id": 3, "name": "Ops"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .and(header("Authorization", BASIC_CREDENTIALS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "next": "/api/v2/organizations/?page=2",
            "previous": null,
            "results": [
                {"id": 1, "name": "Default", "description": ""},
                {"id": 2, "name": "Engineering", "description": "Product teams"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let organisations = awx(&server).organisations().all().try_collect().await.unwrap();

    let ids: Vec<_> = organisations.iter().map(|o| o.id).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(organisations[1].description, "Product teams");
}

#[tokio::test]
async fn test_team_roles_are_nested_under_team() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/teams/2/roles/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{"id": 40, "name": "Execute", "description": "May run the job template"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let roles = awx(&server).teams().roles("2").all().try_collect().await.unwrap();

    assert_eq!(roles[0].name, "Execute");
}

// ============================================================================
// Actions
// ============================================================================

#[tokio::test]
async fn test_launch_returns_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/job_templates/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Deploy",
            "playbook": "site.yml",
            "inventory": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/job_templates/7/launch/"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "job": 42,
            "id": 42,
            "type": "job",
            "name": "Deploy",
            "status": "pending",
            "job_template": 7
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/jobs/42/job_events/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{"id": 900, "event": "playbook_on_start", "counter": 1}]
        })))
        .mount(&server)
        .await;

    let awx = awx(&server);
    let template = awx.job_templates().get("7").await.unwrap();
    assert_eq!(template.playbook.as_deref(), Some("site.yml"));

    let job = awx.job_templates().launch(&template).await.unwrap();
    assert_eq!(job.id, 42);
    assert_eq!(job.status.as_deref(), Some("pending"));

    let events = awx.jobs().job_events(&job).all().try_collect().await.unwrap();
    assert_eq!(events[0].event, "playbook_on_start");
}

#[tokio::test]
async fn test_launch_with_extra_vars() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/job_templates/7/launch/"))
        .and(body_json(json!({"extra_vars": {"release": "1.4.2"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 43})))
        .expect(1)
        .mount(&server)
        .await;

    let job = awx(&server)
        .job_templates()
        .launch_with("7", json!({"extra_vars": {"release": "1.4.2"}}))
        .await
        .unwrap();

    assert_eq!(job.id, 43);
}

#[tokio::test]
async fn test_inventory_copy_update_and_variable_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/inventories/3/copy/"))
        .and(body_json(json!({"name": "staging copy"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 4,
            "name": "staging copy",
            "organization": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v2/inventories/3/"))
        .and(body_json(json!({"name": "staging"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "staging"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/inventories/3/variable_data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ansible_user": "deploy",
            "workers": 3
        })))
        .mount(&server)
        .await;

    let inventories = awx(&server).inventories();

    let copy = inventories.copy("3", "staging copy").await.unwrap();
    assert_eq!(copy.id, 4);
    assert_eq!(copy.organization, Some(1));

    let updated = inventories.update("3", &json!({"name": "staging"})).await.unwrap();
    assert_eq!(updated.name, "staging");

    let data = inventories.variable_data("3").fetch().await.unwrap();
    assert_eq!(data.variables["ansible_user"], "deploy");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_validation_error_falls_back_to_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/teams/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"name":["This field is required."]}"#),
        )
        .mount(&server)
        .await;

    let error = awx(&server)
        .teams()
        .create(&json!({"organization": 1}))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert_eq!(
        error.api_message(),
        Some(r#"{"name":["This field is required."]}"#)
    );
}

#[tokio::test]
async fn test_closed_connection_rejects_requests() {
    let server = MockServer::start().await;
    let awx = awx(&server);
    let jobs = awx.jobs();
    awx.close();

    assert!(jobs.get("1").await.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}
