use std::time::Duration;

use refresh_core::Caught;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Bearer token for the job endpoints. `None` omits the header entirely.
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Failure at the network boundary. The display text is what the classifier sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{method} {path} {status}")]
    Status {
        method: &'static str,
        path: &'static str,
        status: u16,
    },
    #[error("Invalid cursor")]
    InvalidCursor,
    #[error("Failed to load: {0}")]
    PageStatus(u16),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl From<ApiError> for Caught {
    fn from(err: ApiError) -> Self {
        Caught::error(err.to_string())
    }
}
