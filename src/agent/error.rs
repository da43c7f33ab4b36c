//! Error types for provider calls.

use thiserror::Error;

/// Errors that can occur while calling a provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Provider returned an error response (4xx, 5xx).
    #[error("Backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Provider response doesn't match expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Adapter configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The call was abandoned before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl AgentError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            AgentError::Timeout(timeout_ms)
        } else {
            AgentError::Network(e.to_string())
        }
    }
}
