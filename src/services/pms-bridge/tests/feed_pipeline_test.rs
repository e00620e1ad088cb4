//! End-to-end tests for the PMS Bridge Service
//!
//! Each test runs the real router over a temporary tenant directory, with RGBridge
//! replaced by a wiremock server.

use std::sync::Arc;

use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pms_bridge::{
    handlers::create_routes,
    models::{FeedResponse, SchemaKind},
    AppState, BridgeConfig, BridgeService, Stats, TenantCode, TenantStore,
};

struct TestBridge {
    _dir: TempDir,
    state: Arc<AppState>,
    server: TestServer,
}

impl TestBridge {
    async fn start(rgbridge: &MockServer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BridgeConfig::default();
        config.storage.pms_root = dir.path().to_path_buf();
        config.rgbridge.endpoint = format!("{}/rgbridge", rgbridge.uri());
        config.rgbridge.retry_base_delay_ms = 10;
        config.rgbridge.request_timeout_secs = 5;

        let state = Arc::new(AppState::from_config(config).unwrap());
        let server = TestServer::new(create_routes(state.clone())).unwrap();
        Self {
            _dir: dir,
            state,
            server,
        }
    }

    async fn deploy(&self, code: &str, mappings: Value) {
        let response = self
            .server
            .post("/api/deployment/deploy")
            .json(&json!({ "pmsCode": code, "pmsName": code, "mappings": mappings }))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    async fn submit(&self, code: &str, feed: &str) -> axum_test::TestResponse {
        self.server
            .post(&format!("/api/pms/{}", code))
            .json(&json!({ "feedData": feed }))
            .await
    }

    async fn stats(&self, code: &str) -> Stats {
        self.state
            .store
            .load_stats(&TenantCode::parse(code).unwrap())
            .await
            .unwrap()
    }
}

async fn accepting_rgbridge() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rgbridge"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<Ack/>"))
        .mount(&server)
        .await;
    server
}

/// JSON feed with a single mapping and no schema is renamed and counted
#[tokio::test]
async fn test_json_feed_is_translated_and_counted() {
    let rgbridge = accepting_rgbridge().await;
    let bridge = TestBridge::start(&rgbridge).await;
    bridge
        .deploy("acme", json!([{ "sourceField": "roomType", "targetField": "InvCode", "confidence": 0.95 }]))
        .await;

    let response = bridge.submit("acme", r#"{"roomType":"Suite","guest":"Jo"}"#).await;
    assert_eq!(response.status_code(), 200);

    let body: FeedResponse = response.json();
    let translated: Value = serde_json::from_str(&body.translated_data).unwrap();
    assert_eq!(translated, json!({"InvCode": "Suite", "guest": "Jo"}));
    assert_eq!(body.delivery_status, None);

    let stats = bridge.stats("acme").await;
    assert_eq!(stats.records_processed, 1);
    assert_eq!(stats.errors, 0);

    // JSON output is never forwarded
    assert!(rgbridge.received_requests().await.unwrap().is_empty());
}

/// Empty feed is rejected and counted as an error
#[tokio::test]
async fn test_empty_feed_is_rejected() {
    let rgbridge = accepting_rgbridge().await;
    let bridge = TestBridge::start(&rgbridge).await;
    bridge
        .deploy("acme", json!([{ "sourceField": "roomType", "targetField": "InvCode" }]))
        .await;

    let response = bridge.submit("acme", "").await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("feed is required"));

    let stats = bridge.stats("acme").await;
    assert_eq!(stats.records_processed, 0);
    assert_eq!(stats.errors, 1);
}

/// Schema violation stops the feed before translation and delivery
#[tokio::test]
async fn test_schema_violation_blocks_delivery() {
    let rgbridge = accepting_rgbridge().await;
    let bridge = TestBridge::start(&rgbridge).await;
    bridge
        .deploy("acme", json!([{ "sourceField": "roomType", "targetField": "InvCode" }]))
        .await;
    bridge
        .state
        .store
        .save_schema(
            &TenantCode::parse("acme").unwrap(),
            SchemaKind::Json,
            r#"{"type":"object","required":["roomType"]}"#,
        )
        .await
        .unwrap();

    let response = bridge.submit("acme", r#"{"guest":"Jo"}"#).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "SCHEMA_VALIDATION_FAILED");

    assert_eq!(bridge.stats("acme").await.errors, 1);
    assert!(rgbridge.received_requests().await.unwrap().is_empty());
}

/// XML output reaches RGBridge with Basic credentials
#[tokio::test]
async fn test_xml_feed_is_delivered() {
    let rgbridge = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rgbridge"))
        .and(header("content-type", "application/xml"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<Ack/>"))
        .expect(1)
        .mount(&rgbridge)
        .await;

    let bridge = TestBridge::start(&rgbridge).await;
    bridge
        .deploy("acme", json!([{ "sourceField": "roomType", "targetField": "InvCode" }]))
        .await;

    let response = bridge
        .submit("acme", "<Res><roomType>Suite</roomType><rate>99</rate></Res>")
        .await;
    assert_eq!(response.status_code(), 200);

    let body: FeedResponse = response.json();
    assert_eq!(
        body.translated_data,
        "<Res><InvCode>Suite</InvCode><rate>99</rate></Res>"
    );
    assert_eq!(body.delivery_status.as_deref(), Some("Delivered to RGBridge"));

    let requests = rgbridge.received_requests().await.unwrap();
    assert_eq!(
        String::from_utf8(requests[0].body.clone()).unwrap(),
        body.translated_data
    );
}

/// Failed delivery is retried to the bound and reported in an otherwise successful response
#[tokio::test]
async fn test_failing_rgbridge_is_retried_three_times() {
    let rgbridge = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rgbridge"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&rgbridge)
        .await;

    let bridge = TestBridge::start(&rgbridge).await;

    let response = bridge.submit("samplepms", r#"{"roomType":"Suite"}"#).await;
    assert_eq!(response.status_code(), 200);

    let body: FeedResponse = response.json();
    assert_eq!(
        body.delivery_status.as_deref(),
        Some("RGBridge delivery failed: Max retry attempts reached")
    );

    // Delivery failure still counts as a processed record
    let stats = bridge.stats("samplepms").await;
    assert_eq!(stats.records_processed, 1);
    assert_eq!(stats.errors, 0);
}

/// Plugin output wins over a deployed mapping set for the same code
#[tokio::test]
async fn test_plugin_precedence_over_mappings() {
    let rgbridge = accepting_rgbridge().await;
    let bridge = TestBridge::start(&rgbridge).await;
    bridge
        .deploy("samplepms", json!([{ "sourceField": "roomType", "targetField": "InvCode" }]))
        .await;

    let response = bridge.submit("samplepms", r#"{"roomType":"Suite"}"#).await;
    let body: FeedResponse = response.json();
    assert_eq!(
        body.translated_data,
        r#"<RGBridgeMessage>Translated from samplepms: {"roomType":"Suite"}</RGBridgeMessage>"#
    );
}

/// Malformed codes are rejected before any file or network I/O
#[tokio::test]
async fn test_invalid_code_has_no_side_effects() {
    let rgbridge = accepting_rgbridge().await;
    let bridge = TestBridge::start(&rgbridge).await;

    for code in ["bad%20code", "a.b", "caf%C3%A9"] {
        let response = bridge.submit(code, "<Res/>").await;
        assert_eq!(response.status_code(), 400, "code {}", code);
    }

    assert!(rgbridge.received_requests().await.unwrap().is_empty());
    let entries = std::fs::read_dir(bridge.state.store.root()).unwrap().count();
    assert_eq!(entries, 0);
}

/// Concurrent feeds for one tenant never lose a stats update
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_feeds_keep_exact_counts() {
    let rgbridge = accepting_rgbridge().await;
    let bridge = TestBridge::start(&rgbridge).await;
    bridge
        .deploy("acme", json!([{ "sourceField": "roomType", "targetField": "InvCode" }]))
        .await;

    let tasks: Vec<_> = (0..25)
        .map(|i| {
            let state = bridge.state.clone();
            tokio::spawn(async move {
                let feed = if i % 5 == 0 {
                    String::new()
                } else {
                    format!(r#"{{"roomType":"Room {}"}}"#, i)
                };
                state.processor.process("acme", &feed).await.is_ok()
            })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    let successes = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
    assert_eq!(successes, 20);

    let stats = bridge.stats("acme").await;
    assert_eq!(stats.records_processed, 20);
    assert_eq!(stats.errors, 5);
}

#[tokio::test]
async fn test_service_router_serves_health() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BridgeConfig::default();
    config.storage.pms_root = dir.path().to_path_buf();

    let service = BridgeService::new(config).unwrap();
    let server = TestServer::new(BridgeService::router(service.state())).unwrap();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json();
    assert_eq!(body["checks"]["storage"], true);
}
