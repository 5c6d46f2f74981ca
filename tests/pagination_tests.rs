//! Integration tests for listing and pagination.
//!
//! Nova paginates with `<list>_links` entries, Glance with a relative `next`
//! field; both must be followed lazily, one page per exhausted buffer.

mod common;

use cloud_portal::rest::ResourceError;
use common::connect;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Returns the query strings of every request made to `prefix`.
async fn queries_under(server: &MockServer, prefix: &str) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path().starts_with(prefix))
        .map(|request| request.url.query().unwrap_or_default().to_string())
        .collect()
}

fn flavor(id: &str) -> Value {
    json!({"id": id, "name": id, "vcpus": 1, "ram": 512, "disk": 1, "links": []})
}

/// Mounts three pages of flavors: `a b`, `c d`, `e`.
async fn mount_flavor_pages(server: &MockServer, first_page_calls: u64) {
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/v2.1/flavors/detail"))
        .and(query_param("marker", "d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flavors": [flavor("e")]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/flavors/detail"))
        .and(query_param("marker", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flavors": [flavor("c"), flavor("d")],
            "flavors_links": [
                {"rel": "next", "href": format!("{uri}/v2.1/flavors/detail?marker=d")}
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/flavors/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flavors": [flavor("a"), flavor("b")],
            "flavors_links": [
                {"rel": "self", "href": format!("{uri}/v2.1/flavors/detail")},
                {"rel": "next", "href": format!("{uri}/v2.1/flavors/detail?marker=b")}
            ]
        })))
        .expect(first_page_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Link Pagination
// ============================================================================

#[tokio::test]
async fn test_pages_are_fetched_lazily() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    mount_flavor_pages(&server, 1).await;

    let mut flavors = conn.compute().unwrap().flavors().all();
    assert_eq!(flavors.pages_fetched(), 0);

    assert_eq!(flavors.next().await.unwrap().unwrap().id, "a");
    assert_eq!(flavors.next().await.unwrap().unwrap().id, "b");
    assert_eq!(flavors.pages_fetched(), 1);
    assert_eq!(queries_under(&server, "/v2.1/").await.len(), 1);

    assert_eq!(flavors.next().await.unwrap().unwrap().id, "c");
    assert_eq!(flavors.pages_fetched(), 2);
}

#[tokio::test]
async fn test_all_follows_every_next_link_then_restarts() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    mount_flavor_pages(&server, 2).await;
    let manager = conn.compute().unwrap().flavors();

    let ids: Vec<_> = manager
        .all()
        .try_collect()
        .await
        .unwrap()
        .into_iter()
        .map(|flavor| flavor.id)
        .collect();
    assert_eq!(ids, ["a", "b", "c", "d", "e"]);

    let mut again = manager.all();
    assert_eq!(again.next().await.unwrap().unwrap().id, "a");

    assert_eq!(
        queries_under(&server, "/v2.1/").await,
        ["", "marker=b", "marker=d", ""]
    );
}

#[tokio::test]
async fn test_query_applies_to_first_request_only() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    mount_flavor_pages(&server, 1).await;

    let flavors = conn
        .compute()
        .unwrap()
        .flavors()
        .all_with([("minRam", "512")])
        .try_collect()
        .await
        .unwrap();
    assert_eq!(flavors.len(), 5);

    assert_eq!(
        queries_under(&server, "/v2.1/").await,
        ["minRam=512", "marker=b", "marker=d"]
    );
}

#[tokio::test]
async fn test_summary_lists_plain_collection() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2.1/flavors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flavors": [{"id": "a", "name": "tiny", "links": []}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let flavors = conn
        .compute()
        .unwrap()
        .flavors()
        .summary()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(flavors[0].name, "tiny");
    assert_eq!(flavors[0].vcpus, 0);
}

// ============================================================================
// Next-Field Pagination
// ============================================================================

#[tokio::test]
async fn test_relative_next_is_resolved_against_current_page() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/images"))
        .and(query_param("marker", "i1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [{"id": "i2", "name": "debian"}],
            "first": "/v2/images"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [{"id": "i1", "name": "cirros", "min_disk": 1, "tags": ["test"]}],
            "first": "/v2/images",
            "next": "/v2/images?marker=i1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let images = conn.image().unwrap().images().all().try_collect().await.unwrap();

    let names: Vec<_> = images.iter().map(|i| i.name.as_deref().unwrap()).collect();
    assert_eq!(names, ["cirros", "debian"]);
    assert_eq!(images[0].min_disk, 1);
    assert_eq!(images[0].tags, ["test"]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_list_key_is_malformed() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"instances": []})))
        .mount(&server)
        .await;

    let error = conn
        .compute()
        .unwrap()
        .servers()
        .all()
        .try_collect()
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ResourceError::MalformedEnvelope { resource: "Server", ref key } if key == "servers"
    ));
}

#[tokio::test]
async fn test_error_on_later_page_is_returned_after_earlier_entities() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/v2.1/flavors/detail"))
        .and(query_param("marker", "a"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/flavors/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flavors": [flavor("a")],
            "flavors_links": [{"rel": "next", "href": format!("{uri}/v2.1/flavors/detail?marker=a")}]
        })))
        .mount(&server)
        .await;

    let mut flavors = conn.compute().unwrap().flavors().all();
    assert_eq!(flavors.next().await.unwrap().unwrap().id, "a");

    let error = flavors.next().await.unwrap_err();
    assert_eq!(error.status(), Some(503));
    assert_eq!(error.api_message(), Some("Service Unavailable"));
}

#[tokio::test]
async fn test_get_reports_api_message_for_missing_entity() {
    let server = MockServer::start().await;
    let conn = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "itemNotFound": {"code": 404, "message": "Instance missing could not be found."}
        })))
        .mount(&server)
        .await;

    let error = conn.compute().unwrap().servers().get("missing").await.unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert_eq!(error.api_message(), Some("Instance missing could not be found."));
    assert_eq!(error.to_string(), "Instance missing could not be found.");
}
