use crate::api::response::{scout_from_object, AssistantReply};
use crate::api::streaming::{extract_delta, is_event_stream, DeltaAccumulator, OnUpdate, SseParser};
use crate::config::{CLIENT_CONNECT_TIMEOUT_SECS, CLIENT_TIMEOUT_SECS};
use crate::error::{DashError, Result};
use crate::models::ChatMessage;
use futures::StreamExt;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Event name carrying the complete assistant message at the end of a stream.
pub const MESSAGE_EVENT: &str = "message";

/// Client side of `POST /api/chat`, as used by the terminal chat.
#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
    fallback_message: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>, fallback_message: impl Into<String>) -> Result<Self> {
        Self::with_timeout(
            base_url,
            fallback_message,
            Duration::from_secs(CLIENT_TIMEOUT_SECS),
        )
    }

    /// Bound each whole request, streamed body included, by `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        fallback_message: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CLIENT_CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            fallback_message: fallback_message.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn send(&self, query: &str) -> Result<ChatMessage> {
        let response = self
            .http
            .post(self.url("/api/chat"))
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_proxy_response(status, &body, &self.fallback_message)
    }

    /// Like `send`, but reads `/api/chat/stream` and reports the
    /// accumulated text after every delta.
    pub async fn send_streaming(
        &self,
        query: &str,
        on_update: &mut OnUpdate<'_>,
    ) -> Result<ChatMessage> {
        let response = self
            .http
            .post(self.url("/api/chat/stream"))
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() || !is_event_stream(response.headers()) {
            let body = response.text().await?;
            return parse_proxy_response(status.as_u16(), &body, &self.fallback_message);
        }

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();
        let mut accumulator = DeltaAccumulator::new();
        let mut final_message: Option<ChatMessage> = None;

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for item in parser.feed(&chunk) {
                if item.is_done() {
                    break 'outer;
                }
                if item.event.as_deref() == Some(MESSAGE_EVENT) {
                    match serde_json::from_str::<AssistantReply>(&item.data) {
                        Ok(reply) => final_message = Some(reply.into()),
                        Err(e) => debug!("ignoring malformed message event: {}", e),
                    }
                    continue;
                }
                if let Some(delta) = extract_delta(&item.data) {
                    on_update(accumulator.push(&delta));
                }
            }
        }

        if let Some(message) = final_message {
            return Ok(message);
        }

        let text = accumulator.into_text();
        if text.trim().is_empty() {
            warn!("stream ended without any content");
            return Ok(ChatMessage::assistant(self.fallback_message.clone()));
        }
        Ok(ChatMessage::assistant(text))
    }
}

/// Map a `/api/chat` answer onto one assistant message.
///
/// 400 is the only error returned; every other failure becomes the
/// fallback message.
pub fn parse_proxy_response(status: u16, body: &str, fallback: &str) -> Result<ChatMessage> {
    let parsed = serde_json::from_str::<Value>(body.trim()).ok();
    let error_text = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.as_str())
        .map(str::to_string);

    if status == 400 {
        return Err(DashError::BadRequest(
            error_text.unwrap_or_else(|| body.trim().to_string()),
        ));
    }

    if !(200..300).contains(&status) {
        let detail = error_text.unwrap_or_else(|| body.trim().to_string());
        if status == 500 {
            warn!("chat proxy reported a server error: {}", detail);
        } else {
            warn!(status, "chat proxy request failed: {}", detail);
        }
        return Ok(ChatMessage::assistant(fallback));
    }

    let value = match parsed {
        Some(value) => value,
        None if body.trim().is_empty() => return Ok(ChatMessage::assistant(fallback)),
        None => return Ok(ChatMessage::assistant(body.trim())),
    };

    let message = match value {
        Value::Array(items) => items
            .into_iter()
            .find(|item| item.get("role").and_then(|r| r.as_str()) == Some("assistant"))
            .and_then(|item| serde_json::from_value::<AssistantReply>(item).ok())
            .map(ChatMessage::from),
        Value::Object(map) if map.contains_key("error") => None,
        Value::Object(map) if map.contains_key("role") => {
            serde_json::from_value::<AssistantReply>(Value::Object(map))
                .ok()
                .map(ChatMessage::from)
        }
        Value::Object(map) => {
            let result = scout_from_object(&map);
            (!result.is_empty()).then(|| {
                let mut message = ChatMessage::assistant(result.to_content());
                message.result = Some(result);
                message
            })
        }
        Value::String(text) if !text.trim().is_empty() => Some(ChatMessage::assistant(text)),
        _ => None,
    };

    Ok(message
        .filter(|m| !m.content.trim().is_empty())
        .unwrap_or_else(|| ChatMessage::assistant(fallback)))
}
