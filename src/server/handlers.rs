use super::error::ApiError;
use super::AppState;
use crate::api::proxy_client::MESSAGE_EVENT;
use crate::api::response::{FailureKind, Outcome, ScoutReply};
use crate::api::streaming::{paragraph_deltas, DONE_MARKER};
use crate::api::ChatRequest;
use crate::config::ResponseShape;
use axum::{
    extract::State,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use bytes::Bytes;
use futures::stream;
use serde_json::json;
use std::convert::Infallible;
use tracing::info;

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /api/chat`
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let reply = answer(&state, &body).await?;

    let response = match state.response_shape {
        ResponseShape::Messages => Json(vec![reply.to_assistant_reply()]).into_response(),
        ResponseShape::Scout => Json(reply.scout_result()).into_response(),
    };
    Ok(response)
}

/// `POST /api/chat/stream`: paragraph deltas, then the full message, then `[DONE]`.
pub async fn chat_stream(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let reply = answer(&state, &body).await?;
    let message = reply.to_assistant_reply();

    let mut events: Vec<Event> = paragraph_deltas(&reply.content)
        .into_iter()
        .map(|delta| Event::default().data(json!({ "delta": delta }).to_string()))
        .collect();
    events.push(
        Event::default()
            .event(MESSAGE_EVENT)
            .json_data(&message)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    events.push(Event::default().data(DONE_MARKER));

    let stream = stream::iter(events.into_iter().map(Ok::<_, Infallible>));
    Ok(Sse::new(stream).into_response())
}

async fn answer(state: &AppState, body: &[u8]) -> Result<ScoutReply, ApiError> {
    let query = ChatRequest::parse(body)?.into_query()?;
    info!(query_len = query.len(), "forwarding chat query");

    let reply = state.ask(&query).await?;

    if let Outcome::Fallback {
        kind: FailureKind::RemoteStatus(status),
        detail,
    } = &reply.outcome
    {
        return Err(ApiError::BadGateway {
            message: reply.content.clone(),
            detail: Some(match detail {
                Some(detail) => format!("backend status {}: {}", status, detail),
                None => format!("backend status {}", status),
            }),
        });
    }

    Ok(reply)
}
