//! Category classification for inbound requests.
//!
//! Rules are applied in order and the first applicable one wins:
//! tool definitions, missing user message, session continuation, then the
//! configured [`RoutingMode`]. Model-based stages may fail; failures move on
//! to the next stage and finally to keyword matching, which never fails.

mod error;
pub mod keywords;
mod transport;


pub use error::ClassifierError;
pub use keywords::{ContinuationDetector, BUILTIN_CATEGORIES, FALLBACK_CATEGORY, TOOLS_CATEGORY};
pub use transport::{ChatCompletionsTransport, ClassifierTransport, OllamaGenerateTransport};

pub use crate::config::RoutingMode;

use crate::routing::{RoutingDecision, RoutingSource, RoutingTable};
use crate::session::SessionTracker;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default deadline for the local classification model.
pub const DEFAULT_LOCAL_TIMEOUT: Duration = Duration::from_secs(15);
/// Default deadline for the remote classification model.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of message characters included in a classification prompt.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 500;

/// A model-based classification stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Local,
    Remote,
}

impl Stage {
    pub fn source(self) -> RoutingSource {
        match self {
            Stage::Local => RoutingSource::LocalModel,
            Stage::Remote => RoutingSource::RemoteModel,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Local => "local",
            Stage::Remote => "remote",
        }
    }
}

/// Successful result of a model-based stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The model named a known category
    Category(String),
    /// The model named something else; treated as the fallback category
    Unrecognized(String),
}

impl StageOutcome {
    pub fn category(&self) -> &str {
        match self {
            StageOutcome::Category(name) => name,
            StageOutcome::Unrecognized(_) => FALLBACK_CATEGORY,
        }
    }
}

/// Stages to run, in order, for a routing mode.
fn stages_for(mode: RoutingMode) -> &'static [Stage] {
    match mode {
        RoutingMode::Keywords => &[],
        RoutingMode::LocalModel => &[Stage::Local],
        RoutingMode::RemoteModel => &[Stage::Remote],
        RoutingMode::Hybrid => &[Stage::Local, Stage::Remote],
    }
}

/// Decides a request's category.
pub struct CategoryClassifier {
    sessions: Arc<SessionTracker>,
    local: Option<Arc<dyn ClassifierTransport>>,
    remote: Option<Arc<dyn ClassifierTransport>>,
    local_timeout: Duration,
    remote_timeout: Duration,
    max_prompt_chars: usize,
}

impl CategoryClassifier {
    /// Keyword-only classifier; attach transports with the `with_*` methods.
    pub fn new(sessions: Arc<SessionTracker>) -> Self {
        Self {
            sessions,
            local: None,
            remote: None,
            local_timeout: DEFAULT_LOCAL_TIMEOUT,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }

    pub fn with_local(mut self, transport: Arc<dyn ClassifierTransport>, timeout: Duration) -> Self {
        self.local = Some(transport);
        self.local_timeout = timeout;
        self
    }

    pub fn with_remote(mut self, transport: Arc<dyn ClassifierTransport>, timeout: Duration) -> Self {
        self.remote = Some(transport);
        self.remote_timeout = timeout;
        self
    }

    pub fn with_max_prompt_chars(mut self, chars: usize) -> Self {
        self.max_prompt_chars = chars;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionTracker> {
        &self.sessions
    }

    /// Classify one request against a configuration snapshot.
    pub async fn classify(
        &self,
        table: &RoutingTable,
        message: Option<&str>,
        has_tools: bool,
        session_id: &str,
    ) -> RoutingDecision {
        if has_tools {
            return RoutingDecision::new(TOOLS_CATEGORY, RoutingSource::Direct);
        }

        // Keywords see the text as sent. Trimming would hide a trailing "def ".
        let message = match message {
            Some(m) if !m.trim().is_empty() => m,
            _ => return RoutingDecision::new(FALLBACK_CATEGORY, RoutingSource::None),
        };

        if table.continuation.is_continuation(message) {
            if let Some(bound) = self.sessions.lookup(session_id) {
                debug!(session_id, model = %bound, "Continuation, keeping bound model");
                return RoutingDecision::continuation(bound);
            }
        }

        for &stage in stages_for(table.mode) {
            match self.model_stage(stage, table, message).await {
                Ok(outcome) => {
                    if let StageOutcome::Unrecognized(reply) = &outcome {
                        debug!(stage = stage.as_str(), reply = %reply, "Unrecognized category reply");
                    }
                    return RoutingDecision::new(outcome.category(), stage.source());
                }
                Err(e) => {
                    warn!(stage = stage.as_str(), error = %e, "Classifier stage failed, falling through");
                    metrics::counter!(
                        "llm_router_classifier_failures_total",
                        "stage" => stage.as_str()
                    )
                    .increment(1);
                }
            }
        }

        let category = keywords::match_keywords(&table.categories, message).unwrap_or(FALLBACK_CATEGORY);
        RoutingDecision::new(category, RoutingSource::Keyword)
    }

    /// Run one model-based stage. Transport failures, timeouts and empty
    /// replies are errors; an unknown category name is not.
    pub async fn model_stage(
        &self,
        stage: Stage,
        table: &RoutingTable,
        message: &str,
    ) -> Result<StageOutcome, ClassifierError> {
        let (transport, timeout) = match stage {
            Stage::Local => (self.local.as_ref(), self.local_timeout),
            Stage::Remote => (self.remote.as_ref(), self.remote_timeout),
        };
        let transport = transport.ok_or(ClassifierError::NotConfigured(stage.as_str()))?;

        let prompt = build_prompt(table, message, self.max_prompt_chars);
        let reply = tokio::time::timeout(timeout, transport.ask(&prompt, timeout))
            .await
            .map_err(|_| ClassifierError::Timeout(timeout.as_millis() as u64))??;

        parse_reply(table, &reply)
    }
}

/// Classification prompt: truncated message plus the valid category names.
pub fn build_prompt(table: &RoutingTable, message: &str, max_chars: usize) -> String {
    let truncated: String = message.chars().take(max_chars).collect();

    let mut categories = String::new();
    for (name, category) in &table.categories {
        match &category.description {
            Some(desc) => categories.push_str(&format!("- {}: {}\n", name, desc)),
            None => categories.push_str(&format!("- {}\n", name)),
        }
    }

    format!(
        "Classify the user request into exactly one category.\n\
         Categories:\n{}\n\
         Reply with the category name only.\n\n\
         Request: {}",
        categories, truncated
    )
}

/// First whitespace-delimited token of `reply`, lower-cased, checked
/// against the snapshot's categories.
pub fn parse_reply(table: &RoutingTable, reply: &str) -> Result<StageOutcome, ClassifierError> {
    let token = reply
        .split_whitespace()
        .next()
        .ok_or_else(|| ClassifierError::InvalidResponse("empty reply".to_string()))?
        .to_lowercase();

    if table.categories.contains_key(&token) {
        Ok(StageOutcome::Category(token))
    } else {
        Ok(StageOutcome::Unrecognized(token))
    }
}
