use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::defaults::{default_fallback_message, default_timeout_secs};

/// How the query is laid out in the request sent to the scouting backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestWrapping {
    /// `{"query": "..."}`
    #[default]
    Plain,
    /// `{"body": "{\"query\":\"...\"}"}`, for API-gateway style functions
    /// that parse their own body string.
    DoubleEncoded,
}

impl FromStr for RequestWrapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "plain" => Ok(Self::Plain),
            "double_encoded" | "double" | "body" => Ok(Self::DoubleEncoded),
            other => Err(format!(
                "unknown request wrapping '{}' (expected plain or double_encoded)",
                other
            )),
        }
    }
}

impl fmt::Display for RequestWrapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::DoubleEncoded => write!(f, "double_encoded"),
        }
    }
}

/// `scout:` section of the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub request_wrapping: RequestWrapping,
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    #[serde(default)]
    pub include_error_detail: bool,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            request_wrapping: RequestWrapping::default(),
            fallback_message: default_fallback_message(),
            include_error_detail: false,
        }
    }
}
