use crate::config::RequestWrapping;
use crate::error::{DashError, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// Accepted layouts of an inbound chat request.
///
/// Variants are tried in order, so a body carrying both `query` and
/// `input` resolves to `query`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChatRequest {
    Query { query: String },
    Input { input: String },
    Messages { messages: Vec<IncomingMessage> },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Text(String),
    Structured {
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        content: Value,
    },
}

impl IncomingMessage {
    /// Plain text of the message. Content given as a list of parts keeps
    /// only the text parts.
    pub fn text(&self) -> String {
        match self {
            IncomingMessage::Text(text) => text.clone(),
            IncomingMessage::Structured { content, .. } => match content {
                Value::String(text) => text.clone(),
                Value::Array(parts) => parts
                    .iter()
                    .filter_map(|part| match part {
                        Value::String(text) => Some(text.as_str()),
                        Value::Object(_) => part.get("text").and_then(|t| t.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(""),
                _ => String::new(),
            },
        }
    }
}

impl ChatRequest {
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            DashError::BadRequest(format!("expected one of query, input or messages: {}", e))
        })
    }

    /// The single query string to forward, whichever layout carried it.
    pub fn into_query(self) -> Result<String> {
        let query = match self {
            ChatRequest::Query { query } => query,
            ChatRequest::Input { input } => input,
            ChatRequest::Messages { messages } => messages
                .last()
                .map(IncomingMessage::text)
                .unwrap_or_default(),
        };

        let query = query.trim();
        if query.is_empty() {
            return Err(DashError::BadRequest("No query provided".to_string()));
        }
        Ok(query.to_string())
    }
}

/// Body sent to the scouting backend for `query`.
pub fn outbound_body(query: &str, wrapping: RequestWrapping) -> Result<Value> {
    let inner = json!({ "query": query });
    match wrapping {
        RequestWrapping::Plain => Ok(inner),
        RequestWrapping::DoubleEncoded => Ok(json!({ "body": serde_json::to_string(&inner)? })),
    }
}
