//! Session continuity tracking.
//!
//! Remembers which candidate last served each session so trivial follow-up
//! messages can be sent to the same backend without reclassification.

use crate::routing::ModelCandidate;
use dashmap::DashMap;

/// Session id used when a request does not identify its caller.
pub const DEFAULT_SESSION_ID: &str = "default_session";

/// Last successful candidate per session.
///
/// Bindings never expire here. Concurrent binds for the same session are
/// last-writer-wins.
#[derive(Debug, Default)]
pub struct SessionTracker {
    bindings: DashMap<String, ModelCandidate>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `model` as the most recent successful dispatch for `session_id`.
    pub fn bind(&self, session_id: &str, model: ModelCandidate) {
        if let Some(previous) = self.bindings.insert(session_id.to_string(), model) {
            tracing::trace!(session_id, previous = %previous, "Session rebound");
        }
    }

    pub fn lookup(&self, session_id: &str) -> Option<ModelCandidate> {
        self.bindings.get(session_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&self) {
        self.bindings.clear();
    }
}
