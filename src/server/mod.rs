mod error;
mod handlers;

pub use error::ApiError;

use crate::api::{ScoutClient, ScoutReply};
use crate::config::{ConfigSource, ResponseShape};
use crate::error::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    config_source: Arc<dyn ConfigSource>,
    http: reqwest::Client,
    pub response_shape: ResponseShape,
}

impl AppState {
    pub fn new(config_source: Arc<dyn ConfigSource>, response_shape: ResponseShape) -> Self {
        Self {
            config_source,
            http: reqwest::Client::new(),
            response_shape,
        }
    }

    /// Resolve configuration for this request and ask the backend.
    pub async fn ask(&self, query: &str) -> Result<ScoutReply> {
        let config = self.config_source.resolve()?;
        let client = ScoutClient::with_http(self.http.clone(), config)?;
        Ok(client.ask(query).await)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/stream", post(handlers::chat_stream))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("chat proxy listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
