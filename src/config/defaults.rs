pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't reach the dataset scout right now. Please try again in a moment.";

pub fn default_timeout_secs() -> u64 {
    55 // the backend runs live web searches
}

/// Budget for a terminal turn against the proxy; a little above the
/// proxy's own backend timeout.
pub const CLIENT_TIMEOUT_SECS: u64 = 60;

pub const CLIENT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

pub fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

pub fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}
