use bytes::Bytes;
use dash_scout::api::proxy_client::parse_proxy_response;
use dash_scout::api::streaming::{extract_delta, paragraph_deltas, SseParser};
use dash_scout::api::DeltaAccumulator;
use dash_scout::error::DashError;
use serde_json::json;

#[test]
fn test_parser_handles_lines_split_across_chunks() {
    let mut parser = SseParser::new();

    let first = parser.feed(&Bytes::from_static(b"data: {\"delta\":\"Hel"));
    assert!(first.is_empty());

    let second = parser.feed(&Bytes::from_static(b"lo\"}\n\ndata: [DONE]\n"));
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].data, "{\"delta\":\"Hello\"}");
    assert!(second[1].is_done());
}

#[test]
fn test_parser_keeps_multibyte_characters_split_across_chunks() {
    let line = "data: Données météo\n".as_bytes();
    // "é" is 0xC3 0xA9; cut between the two bytes
    let cut = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

    let mut parser = SseParser::new();
    assert!(parser.feed(&Bytes::copy_from_slice(&line[..cut])).is_empty());
    let items = parser.feed(&Bytes::copy_from_slice(&line[cut..]));

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].data, "Données météo");
}

#[test]
fn test_parser_keeps_multibyte_characters_fed_byte_by_byte() {
    let mut parser = SseParser::new();
    let mut items = Vec::new();
    for byte in "event: message\ndata: {\"delta\":\"日本語 ✓\"}\n\n".as_bytes() {
        items.extend(parser.feed(std::slice::from_ref(byte)));
    }

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].event.as_deref(), Some("message"));
    assert_eq!(extract_delta(&items[0].data).as_deref(), Some("日本語 ✓"));
}

#[test]
fn test_parser_tracks_event_names_and_skips_comments() {
    let mut parser = SseParser::new();
    let items = parser.feed(&Bytes::from_static(
        b": keep-alive\nevent: message\ndata: {}\n\ndata: plain\n",
    ));

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].event.as_deref(), Some("message"));
    assert_eq!(items[1].event, None);
    assert_eq!(items[1].data, "plain");
}

#[test]
fn test_parser_finish_flushes_trailing_line() {
    let mut parser = SseParser::new();
    assert!(parser.feed(&Bytes::from_static(b"data: tail")).is_empty());

    let rest = parser.finish();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].data, "tail");
}

#[test]
fn test_extract_delta_shapes() {
    assert_eq!(extract_delta(r#"{"delta":"a"}"#).as_deref(), Some("a"));
    assert_eq!(extract_delta(r#"{"content":"b"}"#).as_deref(), Some("b"));
    assert_eq!(
        extract_delta(r#"{"choices":[{"delta":{"content":"c"}}]}"#).as_deref(),
        Some("c")
    );
    assert_eq!(extract_delta(" raw text").as_deref(), Some(" raw text"));
    assert_eq!(extract_delta("\"quoted\"").as_deref(), Some("quoted"));
}

#[test]
fn test_accumulator_reports_running_text() {
    let mut accumulator = DeltaAccumulator::new();
    let mut seen = Vec::new();

    for delta in ["Dataset", " scouting", " done"] {
        seen.push(accumulator.push(delta).to_string());
    }

    assert_eq!(seen, vec!["Dataset", "Dataset scouting", "Dataset scouting done"]);
    assert_eq!(accumulator.into_text(), "Dataset scouting done");
}

#[test]
fn test_paragraph_deltas_concatenate_to_original() {
    let content = "Summary here\n\nWhy it's relevant: fits\n\nSources:\n- u1";
    let deltas = paragraph_deltas(content);

    assert_eq!(deltas.len(), 3);
    assert_eq!(deltas.concat(), content);
}

#[test]
fn test_proxy_response_message_array() {
    let body = json!([{
        "id": "m1",
        "role": "assistant",
        "content": "S\n\nSources:\n- u1",
        "createdAt": "2026-01-01T00:00:00Z",
        "summary": "S",
        "sources": ["u1"]
    }])
    .to_string();

    let message = parse_proxy_response(200, &body, "FALLBACK").unwrap();

    assert_eq!(message.id, "m1");
    assert_eq!(message.content, "S\n\nSources:\n- u1");
    assert_eq!(message.result.unwrap().sources, vec!["u1".to_string()]);
}

#[test]
fn test_proxy_response_bare_scout_result() {
    let body = json!({ "summary": "S", "relevancyExplained": "R" }).to_string();

    let message = parse_proxy_response(200, &body, "FALLBACK").unwrap();

    assert!(message.content.contains('S'));
    assert!(message.content.contains('R'));
}

#[test]
fn test_proxy_response_failures_degrade_to_fallback() {
    for (status, body) in [
        (500, r#"{"error":"scouting endpoint is not configured"}"#),
        (502, r#"{"error":"FALLBACK","detail":"backend status 503"}"#),
        (200, r#"{"error":"oops"}"#),
        (200, ""),
        (200, "[]"),
    ] {
        let message = parse_proxy_response(status, body, "FALLBACK").unwrap();
        assert_eq!(message.content, "FALLBACK", "status {} body {}", status, body);
    }
}

#[test]
fn test_proxy_response_bad_request_is_error() {
    let result = parse_proxy_response(400, r#"{"error":"No query provided"}"#, "FALLBACK");
    match result {
        Err(DashError::BadRequest(msg)) => assert_eq!(msg, "No query provided"),
        other => panic!("expected bad request, got {:?}", other),
    }
}
