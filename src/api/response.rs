use crate::config::ProxyConfig;
use crate::models::{ChatMessage, Role, ScoutResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

/// Envelopes nest at most this deep before the payload is taken as-is.
const MAX_UNWRAP_DEPTH: usize = 4;

/// Why a turn fell back to the canned message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Network,
    /// Backend answered with an `error` payload.
    Remote,
    /// Backend answered with a failing status and nothing usable.
    RemoteStatus(u16),
    /// Backend answered successfully but said nothing.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    Fallback {
        kind: FailureKind,
        detail: Option<String>,
    },
}

/// Normalized answer for one query.
#[derive(Debug, Clone)]
pub struct ScoutReply {
    pub result: ScoutResult,
    pub content: String,
    pub outcome: Outcome,
}

impl ScoutReply {
    pub fn answered(result: ScoutResult) -> Self {
        let content = result.to_content();
        Self {
            result,
            content,
            outcome: Outcome::Answered,
        }
    }

    pub fn fallback(config: &ProxyConfig, kind: FailureKind, detail: Option<String>) -> Self {
        let content = match (&detail, config.include_error_detail) {
            (Some(detail), true) => format!("{}\n\n({})", config.fallback_message, detail),
            _ => config.fallback_message.clone(),
        };
        Self {
            result: ScoutResult::default(),
            content,
            outcome: Outcome::Fallback { kind, detail },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, Outcome::Fallback { .. })
    }

    /// Structured view for callers that want the payload alone. A fallback
    /// carries its apology as the summary.
    pub fn scout_result(&self) -> ScoutResult {
        if self.is_fallback() {
            ScoutResult::from_summary(self.content.clone())
        } else {
            self.result.clone()
        }
    }

    pub fn to_assistant_reply(&self) -> AssistantReply {
        AssistantReply {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: self.content.clone(),
            created_at: Utc::now(),
            result: self.result.clone(),
        }
    }

    pub fn into_message(self) -> ChatMessage {
        self.to_assistant_reply().into()
    }
}

/// Assistant message as sent over HTTP: the readable `content` with the
/// structured fields flattened next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    #[serde(default = "new_id")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ScoutResult,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl From<AssistantReply> for ChatMessage {
    fn from(reply: AssistantReply) -> Self {
        let content = if reply.content.trim().is_empty() {
            reply.result.to_content()
        } else {
            reply.content
        };
        ChatMessage {
            id: reply.id,
            role: reply.role,
            content,
            created_at: reply.created_at,
            result: (!reply.result.is_empty()).then_some(reply.result),
        }
    }
}

/// Turn whatever the scouting backend sent into a `ScoutReply`.
///
/// Handles flat payloads, `{"body": "<json>"}` and `{"statusCode", "body"}`
/// envelopes, `error` payloads and non-JSON text.
pub fn normalize_response(status: u16, body: &str, config: &ProxyConfig) -> ScoutReply {
    let text = body.trim();
    let mut failed = !(200..300).contains(&status);

    if text.is_empty() {
        let kind = if failed {
            FailureKind::RemoteStatus(status)
        } else {
            FailureKind::Empty
        };
        return ScoutReply::fallback(config, kind, None);
    }

    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(e) => {
            if failed {
                return ScoutReply::fallback(
                    config,
                    FailureKind::RemoteStatus(status),
                    Some(text.to_string()),
                );
            }
            debug!("backend response is not JSON ({}), using it as the summary", e);
            return ScoutReply::answered(ScoutResult::from_summary(text));
        }
    };

    let (payload, inner_status) = unwrap_envelope(value);
    if let Some(inner) = inner_status {
        failed = failed || !(200..300).contains(&inner);
    }
    let effective_status = inner_status.filter(|s| *s >= 300).unwrap_or(status);

    let payload = match payload {
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return ScoutReply::fallback(config, FailureKind::Empty, None);
            }
            return ScoutReply::answered(ScoutResult::from_summary(text));
        }
        Value::Object(map) => map,
        other => {
            debug!("unexpected backend payload: {}", other);
            let kind = if failed {
                FailureKind::RemoteStatus(effective_status)
            } else {
                FailureKind::Empty
            };
            return ScoutReply::fallback(config, kind, None);
        }
    };

    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        // The backend hands back the model output it could not parse; it is
        // still the best answer available.
        if let Some(raw) = string_field(&payload, "raw") {
            return ScoutReply::answered(ScoutResult::from_summary(raw));
        }
        return ScoutReply::fallback(config, FailureKind::Remote, error_detail(error, &payload));
    }

    let result = scout_from_object(&payload);
    if result.is_empty() {
        let kind = if failed {
            FailureKind::RemoteStatus(effective_status)
        } else {
            FailureKind::Empty
        };
        return ScoutReply::fallback(config, kind, string_field(&payload, "message"));
    }

    ScoutReply::answered(result)
}

/// Peel `body` envelopes, returning the payload and any `statusCode` seen.
pub fn unwrap_envelope(mut value: Value) -> (Value, Option<u16>) {
    let mut status = None;

    for _ in 0..MAX_UNWRAP_DEPTH {
        let body = match &value {
            Value::Object(map) if map.contains_key("body") && !is_scout_object(map) => {
                if let Some(code) = map.get("statusCode").and_then(|c| c.as_u64()) {
                    status = u16::try_from(code).ok();
                }
                map.get("body").cloned().unwrap_or(Value::Null)
            }
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
                _ => break,
            },
            _ => break,
        };
        value = body;
    }

    (value, status)
}

fn is_scout_object(map: &Map<String, Value>) -> bool {
    ["summary", "relevancyExplained", "sources", "tools_used"]
        .iter()
        .any(|key| map.contains_key(*key))
}

/// Lenient field extraction: sources may be strings, `{url}` objects or a
/// single string.
pub fn scout_from_object(map: &Map<String, Value>) -> ScoutResult {
    ScoutResult {
        summary: string_field(map, "summary"),
        relevancy_explained: string_field(map, "relevancyExplained")
            .or_else(|| string_field(map, "relevancy_explained")),
        sources: string_list(map.get("sources")),
        tools_used: string_list(map.get("tools_used").or_else(|| map.get("toolsUsed"))),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => ["url", "link", "href"]
                    .iter()
                    .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
                    .map(str::to_string),
                _ => None,
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => vec![],
    }
}

fn error_detail(error: &Value, payload: &Map<String, Value>) -> Option<String> {
    let error = match error {
        Value::String(s) => s.clone(),
        Value::Bool(_) => String::new(),
        other => other.to_string(),
    };
    let message = string_field(payload, "message");

    match (error.trim().is_empty(), message) {
        (false, Some(message)) => Some(format!("{}: {}", message, error)),
        (false, None) => Some(error),
        (true, message) => message,
    }
}
