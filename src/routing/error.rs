//! Error types for routing failures

use thiserror::Error;

/// Errors surfaced by [`RoutingEngine::route`](super::RoutingEngine::route).
///
/// Failures of individual candidates are absorbed by the fallback loop; only
/// exhaustion of the whole list reaches the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RoutingError {
    /// At least one candidate was attempted and every attempt failed
    #[error("All models failed for category '{category}'. Last error: {last_error}")]
    AllCandidatesExhausted {
        category: String,
        last_model: String,
        last_error: String,
    },

    /// Every candidate was skipped because its circuit is open
    #[error("No models available for category '{category}': all circuits open ({})", skipped.join(", "))]
    NoCandidatesAvailable {
        category: String,
        skipped: Vec<String>,
    },

    /// The configuration snapshot cannot produce a candidate list
    #[error("Routing configuration error: {0}")]
    Configuration(String),
}
