use dash_scout::api::response::{normalize_response, unwrap_envelope, FailureKind, Outcome};
use dash_scout::config::ProxyConfig;
use dash_scout::models::{ChatMessage, Role};
use serde_json::json;

fn config() -> ProxyConfig {
    ProxyConfig::new("http://scout.invalid/query").with_fallback_message("FALLBACK")
}

#[test]
fn test_flat_response_flattens_into_content() {
    let body = json!({
        "summary": "S",
        "relevancyExplained": "R",
        "sources": ["https://u1.example", "https://u2.example"]
    });

    let reply = normalize_response(200, &body.to_string(), &config());

    assert_eq!(reply.outcome, Outcome::Answered);
    assert!(reply.content.contains('S'));
    assert!(reply.content.contains('R'));
    assert!(reply.content.contains("https://u1.example"));
    assert!(reply.content.contains("https://u2.example"));
    assert_eq!(reply.result.summary.as_deref(), Some("S"));
    assert_eq!(reply.result.sources.len(), 2);
}

#[test]
fn test_body_wrapped_response_matches_flat() {
    let flat = normalize_response(200, r#"{"summary":"S"}"#, &config());
    let wrapped_body = json!({ "body": "{\"summary\":\"S\"}" }).to_string();
    let wrapped = normalize_response(200, &wrapped_body, &config());

    assert_eq!(wrapped.outcome, Outcome::Answered);
    assert_eq!(wrapped.result, flat.result);
    assert_eq!(wrapped.content, flat.content);
    assert_eq!(wrapped.content, "S");
}

#[test]
fn test_lambda_envelope_is_unwrapped() {
    let inner = json!({
        "summary": "Kaggle has several",
        "relevancyExplained": "matches the topic",
        "sources": ["https://kaggle.com/x"],
        "tools_used": ["serpapi_search"]
    });
    let body = json!({ "statusCode": 200, "body": inner.to_string() }).to_string();

    let reply = normalize_response(200, &body, &config());

    assert_eq!(reply.outcome, Outcome::Answered);
    assert_eq!(reply.result.tools_used, vec!["serpapi_search".to_string()]);
    // Tools are structured-only, not part of the readable text
    assert!(!reply.content.contains("serpapi_search"));
}

#[test]
fn test_lambda_error_is_soft_failure() {
    let inner = json!({
        "error": "parser exploded",
        "message": "An error occurred while processing your request."
    });
    let body = json!({ "statusCode": 500, "body": inner.to_string() }).to_string();

    let reply = normalize_response(200, &body, &config());

    assert_eq!(reply.content, "FALLBACK");
    match reply.outcome {
        Outcome::Fallback { kind, detail } => {
            assert_eq!(kind, FailureKind::Remote);
            assert!(detail.unwrap().contains("parser exploded"));
        }
        other => panic!("expected fallback, got {:?}", other),
    }
}

#[test]
fn test_error_detail_is_appended_when_enabled() {
    let body = json!({ "error": "rate limited" }).to_string();

    let reply = normalize_response(200, &body, &config().with_error_detail(true));

    assert!(reply.content.starts_with("FALLBACK"));
    assert!(reply.content.contains("rate limited"));
}

#[test]
fn test_error_with_raw_output_uses_raw_as_summary() {
    let body = json!({
        "error": "Failed to parse DataQuery",
        "raw": "Here are three climate datasets..."
    })
    .to_string();

    let reply = normalize_response(500, &body, &config());

    assert_eq!(reply.outcome, Outcome::Answered);
    assert_eq!(reply.content, "Here are three climate datasets...");
}

#[test]
fn test_non_json_text_becomes_summary() {
    let reply = normalize_response(200, "just some prose", &config());

    assert_eq!(reply.outcome, Outcome::Answered);
    assert_eq!(reply.result.summary.as_deref(), Some("just some prose"));
    assert_eq!(reply.content, "just some prose");
}

#[test]
fn test_empty_body_falls_back() {
    let reply = normalize_response(200, "   ", &config());

    assert_eq!(reply.content, "FALLBACK");
    assert!(matches!(
        reply.outcome,
        Outcome::Fallback {
            kind: FailureKind::Empty,
            ..
        }
    ));
}

#[test]
fn test_failing_status_without_payload_falls_back() {
    let reply = normalize_response(503, "<html>Service Unavailable</html>", &config());

    assert_eq!(reply.content, "FALLBACK");
    assert!(matches!(
        reply.outcome,
        Outcome::Fallback {
            kind: FailureKind::RemoteStatus(503),
            ..
        }
    ));
}

#[test]
fn test_lenient_source_shapes() {
    let body = json!({
        "summary": "S",
        "sources": [{"url": "https://a.example"}, "https://b.example", 42, ""]
    })
    .to_string();

    let reply = normalize_response(200, &body, &config());

    assert_eq!(
        reply.result.sources,
        vec!["https://a.example".to_string(), "https://b.example".to_string()]
    );
}

#[test]
fn test_unwrap_envelope_keeps_flat_payload_with_body_field() {
    // A result that happens to mention `body` next to scout fields is not an envelope
    let value = json!({ "summary": "S", "body": "ignored" });

    let (payload, status) = unwrap_envelope(value.clone());

    assert_eq!(payload, value);
    assert_eq!(status, None);
}

#[test]
fn test_reply_converts_into_assistant_message() {
    let reply = normalize_response(200, r#"{"summary":"S","sources":["u1"]}"#, &config());
    let wire = reply.to_assistant_reply();
    let json = serde_json::to_value(&wire).unwrap();

    assert_eq!(json["role"], "assistant");
    assert_eq!(json["summary"], "S");
    assert_eq!(json["sources"][0], "u1");
    assert!(json.get("createdAt").is_some());

    let message: ChatMessage = wire.into();
    assert_eq!(message.role, Role::Assistant);
    assert_eq!(message.result.unwrap().summary.as_deref(), Some("S"));
}
