use dash_scout::api::{FailureKind, Outcome, ScoutClient};
use dash_scout::config::{ProxyConfig, RequestWrapping};
use dash_scout::error::DashError;
use serde_json::json;
use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ProxyConfig {
    ProxyConfig::new(format!("{}/query", server.uri()))
        .with_fallback_message("FALLBACK")
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_plain_request_and_flat_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "query": "housing prices" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "Zillow research data",
            "relevancyExplained": "monthly prices by region",
            "sources": ["https://zillow.com/research/data"],
            "tools_used": ["serpapi_search"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ScoutClient::new(config_for(&server)).unwrap();
    let reply = client.ask("housing prices").await;

    assert_eq!(reply.outcome, Outcome::Answered);
    assert!(reply.content.contains("Zillow research data"));
    assert!(reply.content.contains("https://zillow.com/research/data"));
}

#[tokio::test]
async fn test_double_encoded_request_and_wrapped_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "body": "{\"query\":\"river flow\"}" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": 200,
            "body": "{\"summary\":\"USGS water data\"}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_request_wrapping(RequestWrapping::DoubleEncoded);
    let reply = ScoutClient::new(config).unwrap().ask("river flow").await;

    assert_eq!(reply.outcome, Outcome::Answered);
    assert_eq!(reply.content, "USGS water data");
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "summary": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_api_key("secret-token");
    let reply = ScoutClient::new(config).unwrap().ask("anything").await;

    assert_eq!(reply.content, "ok");
}

#[tokio::test]
async fn test_timeout_yields_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "summary": "too late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).with_timeout(Duration::from_millis(200));
    let reply = ScoutClient::new(config).unwrap().ask("slow query").await;

    assert_eq!(reply.content, "FALLBACK");
    assert!(matches!(
        reply.outcome,
        Outcome::Fallback {
            kind: FailureKind::Timeout,
            ..
        }
    ));
}

#[tokio::test]
async fn test_connection_failure_yields_fallback() {
    // Nothing listens on port 1
    let config = ProxyConfig::new("http://127.0.0.1:1/query")
        .with_fallback_message("FALLBACK")
        .with_timeout(Duration::from_secs(5));

    let reply = ScoutClient::new(config).unwrap().ask("anything").await;

    assert_eq!(reply.content, "FALLBACK");
    assert!(matches!(
        reply.outcome,
        Outcome::Fallback {
            kind: FailureKind::Network,
            ..
        }
    ));
}

#[tokio::test]
async fn test_remote_error_payload_is_soft_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "OpenAI quota exceeded",
            "message": "An error occurred while processing your request."
        })))
        .mount(&server)
        .await;

    let reply = ScoutClient::new(config_for(&server))
        .unwrap()
        .ask("anything")
        .await;

    assert_eq!(reply.content, "FALLBACK");
    assert!(matches!(
        reply.outcome,
        Outcome::Fallback {
            kind: FailureKind::Remote,
            ..
        }
    ));
}

#[tokio::test]
async fn test_event_stream_response_is_folded() {
    let server = MockServer::start().await;

    let sse = "data: {\"delta\":\"{\\\"summary\\\":\"}\n\n\
               data: {\"delta\":\"\\\"Streamed summary\\\"}\"}\n\n\
               data: [DONE]\n\n";
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let reply = ScoutClient::new(config_for(&server))
        .unwrap()
        .ask("anything")
        .await;

    assert_eq!(reply.outcome, Outcome::Answered);
    assert_eq!(reply.result.summary.as_deref(), Some("Streamed summary"));
}

#[tokio::test]
async fn test_missing_endpoint_is_config_error() {
    let config = ProxyConfig {
        endpoint: None,
        ..ProxyConfig::new("unused")
    };

    match ScoutClient::new(config) {
        Err(DashError::Config(msg)) => assert!(msg.contains("DASH_SCOUT_ENDPOINT")),
        Err(other) => panic!("expected config error, got {}", other),
        Ok(_) => panic!("expected config error"),
    }
}
