use crate::api::request::outbound_body;
use crate::api::response::{normalize_response, FailureKind, ScoutReply};
use crate::api::streaming::{fold_event_stream, is_event_stream};
use crate::config::ProxyConfig;
use crate::error::{DashError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Headers for the scouting backend: JSON, plus a bearer token if set.
pub fn build_headers(api_key: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(api_key) = api_key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| DashError::Config(format!("Invalid authorization header: {}", e)))?,
        );
    }

    Ok(headers)
}

/// Outbound half of the proxy: forwards one query to the scouting backend
/// and normalizes whatever comes back.
#[derive(Clone)]
pub struct ScoutClient {
    http: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
    config: ProxyConfig,
}

impl ScoutClient {
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Self::with_http(http, config)
    }

    /// Reuse an existing connection pool. Fails when no endpoint is configured.
    pub fn with_http(http: reqwest::Client, config: ProxyConfig) -> Result<Self> {
        let endpoint = config.endpoint()?.to_string();
        let headers = build_headers(config.api_key.as_deref())?;
        Ok(Self {
            http,
            endpoint,
            headers,
            config,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Ask the backend. Transport failures and timeouts come back as the
    /// fallback reply rather than an error.
    pub async fn ask(&self, query: &str) -> ScoutReply {
        let started = Instant::now();

        let reply = match timeout(self.config.timeout, self.exchange(query)).await {
            Ok(Ok((status, body))) => normalize_response(status, &body, &self.config),
            Ok(Err(e)) => {
                warn!(endpoint = %self.endpoint, error = %e, "scouting request failed");
                ScoutReply::fallback(&self.config, FailureKind::Network, Some(e.to_string()))
            }
            Err(_) => {
                warn!(
                    endpoint = %self.endpoint,
                    timeout_secs = self.config.timeout.as_secs_f64(),
                    "scouting request timed out"
                );
                ScoutReply::fallback(&self.config, FailureKind::Timeout, None)
            }
        };

        debug!(
            endpoint = %self.endpoint,
            elapsed_ms = started.elapsed().as_millis() as u64,
            fallback = reply.is_fallback(),
            "scouting request finished"
        );
        reply
    }

    async fn exchange(&self, query: &str) -> Result<(u16, String)> {
        let body = outbound_body(query, self.config.request_wrapping)?;

        let response = self
            .http
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if is_event_stream(response.headers()) {
            let text = fold_event_stream(response, |_| {}).await?;
            return Ok((status, text));
        }

        Ok((status, response.text().await?))
    }
}
