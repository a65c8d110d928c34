use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::{default_bind, default_server_url};

/// Body layout of a successful `POST /api/chat` answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// `[ { id, role: "assistant", content, ...structured fields } ]`
    #[default]
    Messages,
    /// The normalized `ScoutResult` object alone.
    Scout,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub response_shape: ResponseShape,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            response_shape: ResponseShape::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub stream: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionsConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}
