use crate::error::Result;
use futures::StreamExt;
use serde_json::Value;

/// Callback receiving the accumulated reply text after each delta.
pub type OnUpdate<'a> = dyn for<'s> FnMut(&'s str) + Send + 'a;

/// Terminator some backends send as the final `data:` line.
pub const DONE_MARKER: &str = "[DONE]";

/// One `data:` line together with the `event:` name preceding it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseItem {
    pub event: Option<String>,
    pub data: String,
}

impl SseItem {
    pub fn is_done(&self) -> bool {
        self.data == DONE_MARKER
    }
}

/// Incremental server-sent-events decoder.
///
/// Chunks may split lines, or multibyte characters, anywhere; bytes are
/// buffered and only complete lines are decoded.
#[derive(Debug, Default)]
pub struct SseParser {
    incomplete_line: Vec<u8>,
    event: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseItem> {
        self.incomplete_line.extend_from_slice(chunk);

        // Find last newline to ensure we only process complete lines
        let Some(last_newline_pos) = self.incomplete_line.iter().rposition(|b| *b == b'\n') else {
            return vec![];
        };
        let complete: Vec<u8> = self.incomplete_line.drain(..=last_newline_pos).collect();

        self.parse_lines(&complete)
    }

    /// Flush a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Vec<SseItem> {
        let rest = std::mem::take(&mut self.incomplete_line);
        self.parse_lines(&rest)
    }

    fn parse_lines(&mut self, bytes: &[u8]) -> Vec<SseItem> {
        String::from_utf8_lossy(bytes)
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    fn parse_line(&mut self, line: &str) -> Option<SseItem> {
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            // Blank line ends the current event
            self.event = None;
            return None;
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(colon_pos) => {
                let value = &line[colon_pos + 1..];
                (&line[..colon_pos], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field.trim() {
            "data" => Some(SseItem {
                event: self.event.clone(),
                data: value.to_string(),
            }),
            "event" => {
                self.event = Some(value.to_string());
                None
            }
            _ => None,
        }
    }
}

/// Text carried by one streamed delta.
///
/// Understands raw text, `{"delta": ..}`, `{"content": ..}`, `{"text": ..}`
/// and chat-completion chunks (`choices[].delta.content`).
pub fn extract_delta(data: &str) -> Option<String> {
    let value = match serde_json::from_str::<Value>(data) {
        Ok(value) => value,
        Err(_) => return Some(data.to_string()),
    };

    match &value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => {
            for key in ["delta", "content", "text"] {
                if let Some(text) = map.get(key).and_then(|v| v.as_str()) {
                    return Some(text.to_string());
                }
            }

            let choices = map.get("choices").and_then(|c| c.as_array())?;
            let text: String = choices
                .iter()
                .filter_map(|choice| {
                    choice
                        .get("delta")
                        .and_then(|d| d.get("content"))
                        .and_then(|c| c.as_str())
                })
                .collect();
            Some(text)
        }
        // Numbers, booleans and the like are text that happened to parse
        _ => Some(data.to_string()),
    }
}

/// Running concatenation of streamed deltas.
#[derive(Debug, Default, Clone)]
pub struct DeltaAccumulator {
    text: String,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and return everything received so far.
    pub fn push(&mut self, delta: &str) -> &str {
        self.text.push_str(delta);
        &self.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Consume an event stream, calling `on_update` with the text so far after
/// each delta. Stops at `[DONE]` or the end of the body.
pub async fn fold_event_stream<F>(response: reqwest::Response, mut on_update: F) -> Result<String>
where
    F: FnMut(&str),
{
    let mut stream = response.bytes_stream();
    let mut parser = SseParser::new();
    let mut accumulator = DeltaAccumulator::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for item in parser.feed(&chunk) {
            if item.is_done() {
                return Ok(accumulator.into_text());
            }
            if let Some(delta) = extract_delta(&item.data) {
                on_update(accumulator.push(&delta));
            }
        }
    }

    for item in parser.finish() {
        if item.is_done() {
            break;
        }
        if let Some(delta) = extract_delta(&item.data) {
            on_update(accumulator.push(&delta));
        }
    }

    Ok(accumulator.into_text())
}

/// Split a finished reply into paragraph deltas whose concatenation is
/// the original text.
pub fn paragraph_deltas(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .enumerate()
        .map(|(index, part)| {
            if index == 0 {
                part.to_string()
            } else {
                format!("\n\n{}", part)
            }
        })
        .collect()
}

pub fn is_event_stream(headers: &reqwest::header::HeaderMap) -> bool {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/event-stream"))
        .unwrap_or(false)
}
