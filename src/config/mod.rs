mod defaults;
mod scout;
mod server;
mod validation;

use crate::cli::Args;
use crate::error::{DashError, Result as DashResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub use defaults::{
    CLIENT_CONNECT_TIMEOUT_SECS, CLIENT_TIMEOUT_SECS, DEFAULT_BIND, DEFAULT_FALLBACK_MESSAGE,
    DEFAULT_SERVER_URL,
};
pub use scout::{RequestWrapping, ScoutConfig};
pub use server::{ClientConfig, ResponseShape, ServerConfig, SessionsConfig};
pub use validation::{env_string, expand_env_var_in_string, parse_bool, parse_timeout_secs};

/// Settings the proxy needs for one outbound call to the scouting backend.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub request_wrapping: RequestWrapping,
    pub fallback_message: String,
    pub include_error_detail: bool,
}

impl ProxyConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::from_scout_config(&ScoutConfig::default())
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_request_wrapping(mut self, wrapping: RequestWrapping) -> Self {
        self.request_wrapping = wrapping;
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn with_error_detail(mut self, include: bool) -> Self {
        self.include_error_detail = include;
        self
    }

    /// Build from the file section alone, expanding `${VAR}` references.
    pub fn from_scout_config(scout: &ScoutConfig) -> Self {
        Self {
            endpoint: scout
                .endpoint
                .as_deref()
                .map(expand_env_var_in_string)
                .filter(|e| !e.trim().is_empty()),
            api_key: scout
                .api_key
                .as_deref()
                .map(expand_env_var_in_string)
                .filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(timeout_secs(scout)),
            request_wrapping: scout.request_wrapping,
            fallback_message: scout.fallback_message.clone(),
            include_error_detail: scout.include_error_detail,
        }
    }

    /// Layer `DASH_*` environment variables over the file section.
    pub fn from_scout_config_and_env(scout: &ScoutConfig) -> Self {
        let mut config = Self::from_scout_config(scout);

        if let Some(endpoint) = env_string("DASH_SCOUT_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Some(api_key) = env_string("DASH_SCOUT_API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Some(raw) = env_string("DASH_SCOUT_TIMEOUT") {
            match parse_timeout_secs(&raw) {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(e) => warn!("ignoring DASH_SCOUT_TIMEOUT: {}", e),
            }
        }
        if let Some(raw) = env_string("DASH_REQUEST_WRAPPING") {
            match raw.parse::<RequestWrapping>() {
                Ok(wrapping) => config.request_wrapping = wrapping,
                Err(e) => warn!("ignoring DASH_REQUEST_WRAPPING: {}", e),
            }
        }
        if let Some(message) = env_string("DASH_FALLBACK_MESSAGE") {
            config.fallback_message = message;
        }
        if let Some(include) = env_string("DASH_INCLUDE_ERROR_DETAIL").and_then(|v| parse_bool(&v))
        {
            config.include_error_detail = include;
        }

        config
    }

    /// The configured endpoint, or a configuration error naming how to set it.
    pub fn endpoint(&self) -> DashResult<&str> {
        self.endpoint.as_deref().ok_or_else(|| {
            DashError::Config(
                "scouting endpoint is not configured (set DASH_SCOUT_ENDPOINT or scout.endpoint)"
                    .to_string(),
            )
        })
    }
}

fn timeout_secs(scout: &ScoutConfig) -> u64 {
    if scout.timeout_secs == 0 {
        warn!(
            "ignoring scout.timeout_secs = 0, using {}s",
            defaults::default_timeout_secs()
        );
        return defaults::default_timeout_secs();
    }
    scout.timeout_secs
}

/// Produces a fresh `ProxyConfig` each time a request is handled.
pub trait ConfigSource: Send + Sync {
    fn resolve(&self) -> DashResult<ProxyConfig>;
}

impl ConfigSource for ProxyConfig {
    fn resolve(&self) -> DashResult<ProxyConfig> {
        Ok(self.clone())
    }
}

/// Re-reads the config file and the environment on every request.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigSource {
    pub config_path: Option<PathBuf>,
    pub endpoint_override: Option<String>,
}

impl ConfigSource for EnvConfigSource {
    fn resolve(&self) -> DashResult<ProxyConfig> {
        let file = FileConfig::load_from(self.config_path.as_deref())?;
        let mut config = ProxyConfig::from_scout_config_and_env(&file.scout);
        if let Some(endpoint) = &self.endpoint_override {
            config.endpoint = Some(endpoint.clone());
        }
        Ok(config)
    }
}

/// On-disk configuration, YAML or JSON.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub scout: ScoutConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl FileConfig {
    /// Load an explicit file, or the first file found on the search path.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::parse_file(path),
            None => Self::load(),
        }
    }

    pub fn load() -> Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::parse_file(&path);
            }
        }

        // No config file found, return default
        Ok(FileConfig::default())
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let config = if is_yaml {
            serde_yaml::from_str(&contents).with_context(|| {
                format!("Failed to parse YAML config file: {}", path.display())
            })?
        } else {
            serde_json::from_str(&contents).with_context(|| {
                format!("Failed to parse JSON config file: {}", path.display())
            })?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".dash.yaml"),
            PathBuf::from(".dash.yml"),
            PathBuf::from(".dash.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("dash");
            paths.push(config_dir.join("dash.yaml"));
            paths.push(config_dir.join("dash.yml"));
            paths.push(config_dir.join("dash.json"));
        }

        paths
    }

    /// Default location for `dash init-config`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("dash").join("dash.yaml"))
    }

    pub fn example_yaml() -> &'static str {
        r#"# dash configuration
scout:
  # URL of the dataset scouting function
  endpoint: ${DASH_SCOUT_ENDPOINT}
  # api_key: ${DASH_SCOUT_API_KEY}
  timeout_secs: 55
  # plain: {"query": "..."}; double_encoded: {"body": "{\"query\":\"...\"}"}
  request_wrapping: plain
  include_error_detail: false

server:
  bind: 127.0.0.1:3000
  # messages: [ {assistant message} ]; scout: the bare dataset summary
  response_shape: messages

client:
  server_url: http://127.0.0.1:3000
  stream: false

# sessions:
#   path: ~/.cache/dash/sessions.json
"#
    }
}

/// Everything the binary needs, resolved from CLI args > env > file > defaults.
pub struct Config {
    pub config_path: Option<PathBuf>,
    pub proxy: ProxyConfig,
    pub bind: String,
    pub response_shape: ResponseShape,
    pub server_url: String,
    pub stream: bool,
    pub sessions_path: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        let file = FileConfig::load_from(args.config.as_deref())?;

        let mut proxy = ProxyConfig::from_scout_config_and_env(&file.scout);
        if let Some(endpoint) = &args.endpoint {
            proxy.endpoint = Some(endpoint.clone());
        }

        let bind = env_string("DASH_BIND").unwrap_or(file.server.bind);

        let server_url = env_string("DASH_SERVER_URL").unwrap_or(file.client.server_url);

        let stream = env_string("DASH_STREAM")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(file.client.stream);

        let sessions_path = env_string("DASH_SESSIONS_PATH")
            .map(PathBuf::from)
            .or(file.sessions.path);

        Ok(Config {
            config_path: args.config.clone(),
            proxy,
            bind,
            response_shape: file.server.response_shape,
            server_url,
            stream,
            sessions_path,
            verbose: args.verbose,
        })
    }

    /// Source the server uses to re-resolve proxy settings per request.
    pub fn config_source(&self, endpoint_override: Option<String>) -> EnvConfigSource {
        EnvConfigSource {
            config_path: self.config_path.clone(),
            endpoint_override,
        }
    }
}
