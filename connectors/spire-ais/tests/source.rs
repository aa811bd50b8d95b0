//! Source lifecycle tests.

mod common;

use common::{FakeClient, page, transient, vessel};
use fcp_spire_ais::{AisError, CONNECTOR_NAME, Position, SpireSource};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn configured(extra: Value) -> SpireSource {
    let mut params = json!({
        "token": "test-token",
        "retryAttempts": 1,
        "retryDelayMs": 1
    });
    if let (Some(params), Some(extra)) = (params.as_object_mut(), extra.as_object()) {
        params.extend(extra.clone());
    }
    let mut source = SpireSource::new();
    source.configure(params).unwrap();
    source
}

#[test]
fn test_specification_names_connector() {
    let spec = SpireSource::specification();
    assert_eq!(spec.name, CONNECTOR_NAME);
    assert_eq!(spec.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_configure_requires_token() {
    let mut source = SpireSource::new();
    let err = source.configure(json!({"batchSize": 10})).unwrap_err();
    assert!(matches!(err, AisError::Config(_)));
    assert!(source.config().is_none());
}

#[test]
fn test_configure_rejects_bad_batch_size() {
    let mut source = SpireSource::new();
    let err = source
        .configure(json!({"token": "t", "batchSize": "many"}))
        .unwrap_err();
    assert_eq!(err.code(), "invalid_config");
}

#[test]
fn test_open_before_configure() {
    let mut source = SpireSource::new();
    let err = source.open(Position::default()).unwrap_err();
    assert!(matches!(err, AisError::NotConfigured));
}

#[tokio::test]
async fn test_read_before_open() {
    let mut source = configured(json!({}));
    let err = source.read().await.unwrap_err();
    assert!(matches!(err, AisError::NotOpened));
}

#[tokio::test]
async fn test_reads_then_backs_off_when_exhausted() {
    let client = FakeClient::new();
    client.push_page(page(vec![vessel("a"), vessel("b")], false, "c1"));
    let mut source = configured(json!({}));
    source
        .open_with_client(Position::default(), client.clone())
        .unwrap();

    assert_eq!(source.read().await.unwrap().key, b"a");
    assert_eq!(source.read().await.unwrap().key, b"b");
    for _ in 0..2 {
        assert!(source.read().await.unwrap_err().is_backoff());
    }
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_fresh_open_backs_off_on_fetch_failure() {
    let client = FakeClient::new();
    client.push_error(transient("connection refused"));
    let mut source = configured(json!({}));
    source
        .open_with_client(Position::default(), client.clone())
        .unwrap();

    assert!(source.read().await.unwrap_err().is_backoff());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_resumed_first_read_surfaces_fetch_error() {
    let client = FakeClient::new();
    client.push_error(transient("connection refused"));
    client.push_error(transient("connection refused"));
    let mut source = configured(json!({}));
    source
        .open_with_client(Position::from_cursor("c5"), client.clone())
        .unwrap();

    let err = source.read().await.unwrap_err();
    assert!(matches!(err, AisError::Fetch { .. }));
    assert!(err.to_string().contains("connection refused"));

    assert!(source.read().await.unwrap_err().is_backoff());
    assert_eq!(client.afters(), vec![Some("c5".to_string()); 2]);
}

#[tokio::test]
async fn test_never_policy_backs_off_on_resume() {
    let client = FakeClient::new();
    client.push_error(transient("connection refused"));
    let mut source = configured(json!({"firstRead": "never"}));
    source
        .open_with_client(Position::from_cursor("c5"), client.clone())
        .unwrap();

    assert!(source.read().await.unwrap_err().is_backoff());
}

#[tokio::test]
async fn test_forced_read_of_empty_page_backs_off() {
    let client = FakeClient::new();
    client.push_page(page(Vec::new(), true, "c1"));
    let mut source = configured(json!({"firstRead": "always"}));
    source
        .open_with_client(Position::default(), client.clone())
        .unwrap();

    assert!(source.read().await.unwrap_err().is_backoff());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_ack_and_teardown_without_open() {
    let mut source = SpireSource::new();
    source.ack(&Position::from_cursor("c1")).unwrap();
    source.teardown().unwrap();
    source.teardown().unwrap();
}

#[tokio::test]
async fn test_read_after_teardown() {
    let client = FakeClient::new();
    let mut source = configured(json!({}));
    source.open_with_client(Position::default(), client).unwrap();
    source.teardown().unwrap();

    assert!(source.iterator().is_none());
    assert!(matches!(
        source.read().await.unwrap_err(),
        AisError::NotOpened
    ));
}

#[tokio::test]
async fn test_discard_unreadable_vessel_through_source() {
    let client = FakeClient::new();
    client.push_page(page(
        vec![common::vessel_at("bad", "not a time"), vessel("good")],
        false,
        "c1",
    ));
    let mut source = configured(json!({}));
    source
        .open_with_client(Position::default(), client.clone())
        .unwrap();

    let err = source.read().await.unwrap_err();
    assert_eq!(err.code(), "transform_failed");

    source.iterator_mut().unwrap().discard_next();
    assert_eq!(source.read().await.unwrap().key, b"good");
}

fn page_body(ids: &[&str], has_next_page: bool, end_cursor: &str) -> Value {
    let nodes: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "updateTimestamp": "2021-10-01T15:00:00Z"}))
        .collect();
    json!({
        "data": {
            "vessels": {
                "pageInfo": {"hasNextPage": has_next_page, "endCursor": end_cursor},
                "totalCount": {"value": 3, "relation": "eq"},
                "nodes": nodes
            }
        }
    })
}

#[tokio::test]
async fn test_end_to_end_against_graphql_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer test-token"))
        .and(|request: &Request| {
            request
                .body_json::<Value>()
                .is_ok_and(|body| body["variables"].get("after").is_none())
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a", "b"], true, "c1")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"variables": {"first": 2, "after": "c1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["c"], false, "c2")))
        .expect(1)
        .mount(&server)
        .await;

    let mut source = configured(json!({
        "apiUrl": format!("{}/graphql", server.uri()),
        "batchSize": 2
    }));
    source.open(Position::default()).unwrap();

    let mut records = Vec::new();
    for _ in 0..3 {
        records.push(source.read().await.unwrap());
    }
    assert!(source.read().await.unwrap_err().is_backoff());

    let keys: Vec<&[u8]> = records.iter().map(|r| r.key.as_slice()).collect();
    assert_eq!(keys, vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]);
    assert_eq!(records[0].position, Position::from_cursor("c1"));
    assert_eq!(records[2].position, Position::from_cursor("c2"));
}
