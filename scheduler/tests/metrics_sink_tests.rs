//! Metrics sink tests: observational only, never propagates failures.

use scheduler::metrics::MetricsSink;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn records_up_and_down_signals() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .and(body_partial_json(serde_json::json!({
            "metric": "i-app",
            "region": "eu-west-1",
            "value": 1,
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = MetricsSink::new(format!("{}/ingest", server.uri()));
    assert!(sink.is_enabled());
    sink.record_state("eu-west-1", "i-app", true).await;

    server.verify().await;
}

#[tokio::test]
async fn empty_endpoint_disables_the_sink() {
    let sink = MetricsSink::new(String::new());
    assert!(!sink.is_enabled());
    // must be a no-op, not an error
    sink.record_state("eu-west-1", "i-app", true).await;
}

#[tokio::test]
async fn endpoint_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = MetricsSink::new(server.uri());
    // logs a warning and returns; nothing to assert beyond not panicking
    sink.record_state("eu-west-1", "i-app", false).await;
}
