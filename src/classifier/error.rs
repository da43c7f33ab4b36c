//! Error types for model-based classification stages.

use thiserror::Error;

/// Failure of a model-based classification stage.
///
/// Always recovered inside the classifier by moving on to the next stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Transport could not reach the classification model.
    #[error("Network error: {0}")]
    Network(String),

    /// Classification call exceeded its deadline.
    #[error("Classification timeout after {0}ms")]
    Timeout(u64),

    /// Classification model returned a non-success status.
    #[error("Classifier backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Reply could not be decoded or was empty.
    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),

    /// The stage has no transport configured.
    #[error("No {0} classifier configured")]
    NotConfigured(&'static str),
}

impl ClassifierError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            ClassifierError::Timeout(timeout_ms)
        } else {
            ClassifierError::Network(e.to_string())
        }
    }
}
