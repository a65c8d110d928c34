use crate::error::DashError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Failures surfaced to HTTP callers as `{ "error": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    /// The backend failed and nothing usable came back; `message` is the
    /// fallback text shown to the user.
    #[error("{message}")]
    BadGateway {
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        match err {
            DashError::BadRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Internal(msg) => error!("chat request failed: {}", msg),
            Self::BadGateway { detail, .. } => {
                warn!(detail = detail.as_deref().unwrap_or(""), "scouting backend failed")
            }
            Self::BadRequest(msg) => warn!("rejected chat request: {}", msg),
        }

        let detail = match &self {
            Self::BadGateway { detail, .. } => detail.clone(),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}
