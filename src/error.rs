use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    /// Missing or invalid configuration, e.g. no scouting endpoint.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request carried no usable query.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A turn was submitted while another one is still awaiting a response.
    #[error("A response is still pending for this conversation")]
    Busy,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for DashError {
    fn from(err: anyhow::Error) -> Self {
        DashError::Other(err.to_string())
    }
}

impl From<String> for DashError {
    fn from(msg: String) -> Self {
        DashError::Other(msg)
    }
}

impl From<&str> for DashError {
    fn from(msg: &str) -> Self {
        DashError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
