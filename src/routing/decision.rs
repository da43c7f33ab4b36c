//! Routing decisions and outcomes.

use super::ModelCandidate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which rule produced a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingSource {
    /// No user message to classify
    None,
    /// Decided by request shape (tool definitions attached)
    Direct,
    /// Short follow-up kept on the session's bound model
    Continuation,
    LocalModel,
    RemoteModel,
    Keyword,
}

impl RoutingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingSource::None => "none",
            RoutingSource::Direct => "direct",
            RoutingSource::Continuation => "continuation",
            RoutingSource::LocalModel => "local_model",
            RoutingSource::RemoteModel => "remote_model",
            RoutingSource::Keyword => "keyword",
        }
    }
}

impl fmt::Display for RoutingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category and the rule that chose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub category: String,
    pub source: RoutingSource,
    /// For continuations, the model the session is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_model: Option<ModelCandidate>,
}

impl RoutingDecision {
    pub fn new(category: impl Into<String>, source: RoutingSource) -> Self {
        Self {
            category: category.into(),
            source,
            pinned_model: None,
        }
    }

    pub fn continuation(model: ModelCandidate) -> Self {
        Self {
            category: crate::classifier::FALLBACK_CATEGORY.to_string(),
            source: RoutingSource::Continuation,
            pinned_model: Some(model),
        }
    }
}

/// Successful dispatch.
#[derive(Debug, Clone)]
pub struct RoutingOutcome {
    /// Candidate that produced the response
    pub selected: ModelCandidate,
    /// Provider response body, passed through untouched
    pub response: serde_json::Value,
    pub decision: RoutingDecision,
    /// Candidates actually called, including the successful one
    pub attempts: u32,
    pub latency: Duration,
}
