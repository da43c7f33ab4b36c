//! Category routing with ordered fallback.
//!
//! The [`RoutingEngine`] ties the pieces together for one request:
//!
//! 1. classify the last user message into a category,
//! 2. resolve the category to an ordered candidate list from the current
//!    [`RoutingTable`] snapshot,
//! 3. call candidates in order, skipping open circuits, until one succeeds.
//!
//! Order is exactly the configured order. There is no weighting or load
//! balancing; a failed-over request may reach more than one backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn, Instrument};

mod candidate;
mod decision;
mod error;
mod snapshot;


pub use candidate::{ModelCandidate, Provider};
pub use decision::{RoutingDecision, RoutingOutcome, RoutingSource};
pub use error::RoutingError;
pub use snapshot::{ConfigStore, RoutingTable};

use crate::agent::{millis, AdapterMap, AgentError};
use crate::api::types::ChatCompletionRequest;
use crate::circuit::CircuitBreaker;
use crate::classifier::{CategoryClassifier, FALLBACK_CATEGORY};
use crate::logging::{generate_request_id, preview_message};
use crate::metrics::{MetricsSink, RoutingRecord};
use crate::session::SessionTracker;

/// Default bound on a single provider call.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Fallback dispatcher for chat requests.
pub struct RoutingEngine {
    config: Arc<ConfigStore>,
    classifier: CategoryClassifier,
    circuit: Arc<CircuitBreaker>,
    adapters: AdapterMap,
    metrics: Arc<dyn MetricsSink>,
    attempt_timeout: Duration,
    enable_content_logging: bool,
}

impl RoutingEngine {
    pub fn new(
        config: Arc<ConfigStore>,
        classifier: CategoryClassifier,
        circuit: Arc<CircuitBreaker>,
        adapters: AdapterMap,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            classifier,
            circuit,
            adapters,
            metrics,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            enable_content_logging: false,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_content_logging(mut self, enabled: bool) -> Self {
        self.enable_content_logging = enabled;
        self
    }

    pub fn config_store(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn circuit(&self) -> &Arc<CircuitBreaker> {
        &self.circuit
    }

    pub fn sessions(&self) -> &Arc<SessionTracker> {
        self.classifier.sessions()
    }

    /// Route one request.
    ///
    /// # Cancellation Safety
    ///
    /// Dropping the future cancels the in-flight classifier or provider
    /// call. A provider attempt dropped mid-flight counts as a failure for
    /// that candidate's circuit.
    pub async fn route(
        &self,
        request: &ChatCompletionRequest,
        session_id: &str,
    ) -> Result<RoutingOutcome, RoutingError> {
        let request_id = generate_request_id();
        let span = info_span!("route", request_id = %request_id, session_id = %session_id);
        self.route_inner(request, session_id).instrument(span).await
    }

    async fn route_inner(
        &self,
        request: &ChatCompletionRequest,
        session_id: &str,
    ) -> Result<RoutingOutcome, RoutingError> {
        let start = Instant::now();
        let table = self.config.snapshot();
        let message = request.last_user_message();

        if let Some(preview) = preview_message(message.as_deref(), self.enable_content_logging) {
            debug!(preview = %preview, "Routing request");
        }

        let decision = self
            .classifier
            .classify(&table, message.as_deref(), request.has_tools(), session_id)
            .await;
        let candidates = match resolve_candidates(&table, &decision) {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(category = %decision.category, error = %error, "Routing failed");
                self.metrics.record(&RoutingRecord {
                    category: decision.category.clone(),
                    source: decision.source,
                    model: "none".to_string(),
                    success: false,
                    latency: start.elapsed(),
                    attempts: 0,
                    error: Some(error.to_string()),
                });
                return Err(error);
            }
        };

        info!(
            category = %decision.category,
            source = %decision.source,
            candidates = candidates.len(),
            "Request classified"
        );

        let mut attempts = 0u32;
        let mut skipped = Vec::new();
        let mut last_failure: Option<(ModelCandidate, AgentError)> = None;

        for candidate in candidates {
            let id = candidate.id();
            if !self.circuit.is_available(&id) {
                info!(model = %id, "Skipping candidate, circuit open");
                skipped.push(id);
                continue;
            }

            attempts += 1;
            debug!(model = %id, attempt = attempts, "Trying candidate");

            match self.attempt(&candidate, request).await {
                Ok(response) => {
                    self.sessions().bind(session_id, candidate.clone());
                    let latency = start.elapsed();
                    info!(
                        model = %id,
                        attempts,
                        latency_ms = latency.as_millis() as u64,
                        "Request routed"
                    );
                    self.metrics.record(&RoutingRecord {
                        category: decision.category.clone(),
                        source: decision.source,
                        model: id,
                        success: true,
                        latency,
                        attempts,
                        error: None,
                    });
                    return Ok(RoutingOutcome {
                        selected: candidate,
                        response,
                        decision,
                        attempts,
                        latency,
                    });
                }
                Err(e) => {
                    warn!(model = %id, error = %e, "Candidate failed, trying next");
                    last_failure = Some((candidate, e));
                }
            }
        }

        let latency = start.elapsed();
        let error = match last_failure {
            Some((candidate, e)) => RoutingError::AllCandidatesExhausted {
                category: decision.category.clone(),
                last_model: candidate.id(),
                last_error: e.to_string(),
            },
            None => RoutingError::NoCandidatesAvailable {
                category: decision.category.clone(),
                skipped,
            },
        };

        warn!(category = %decision.category, attempts, error = %error, "Routing failed");
        let model = match &error {
            RoutingError::AllCandidatesExhausted { last_model, .. } => last_model.clone(),
            _ => "none".to_string(),
        };
        self.metrics.record(&RoutingRecord {
            category: decision.category.clone(),
            source: decision.source,
            model,
            success: false,
            latency,
            attempts,
            error: Some(error.to_string()),
        });

        Err(error)
    }

    /// One bounded provider call, with its outcome recorded on the circuit.
    async fn attempt(
        &self,
        candidate: &ModelCandidate,
        request: &ChatCompletionRequest,
    ) -> Result<serde_json::Value, AgentError> {
        let id = candidate.id();
        let adapter = match self.adapters.get(&candidate.provider) {
            Some(adapter) => Arc::clone(adapter),
            None => {
                self.circuit.record_failure(&id);
                return Err(AgentError::Configuration(format!(
                    "no adapter registered for provider '{}'",
                    candidate.provider
                )));
            }
        };

        let guard = AttemptGuard {
            circuit: &self.circuit,
            id: &id,
            armed: true,
        };

        let result = match tokio::time::timeout(
            self.attempt_timeout,
            adapter.call(candidate, request, self.attempt_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout(millis(self.attempt_timeout))),
        };

        guard.complete(result.is_ok());
        result
    }
}

/// Candidate list for a decision.
///
/// A continuation tries the bound model first, then the `conversation`
/// list without it.
fn resolve_candidates(
    table: &RoutingTable,
    decision: &RoutingDecision,
) -> Result<Vec<ModelCandidate>, RoutingError> {
    match &decision.pinned_model {
        Some(pinned) => {
            let mut candidates = vec![pinned.clone()];
            if let Ok(rest) = table.candidates_for(FALLBACK_CATEGORY) {
                candidates.extend(rest.into_iter().filter(|c| c != pinned));
            }
            Ok(candidates)
        }
        None => table.candidates_for(&decision.category),
    }
}

/// Records a circuit failure if the attempt future is dropped before completing.
struct AttemptGuard<'a> {
    circuit: &'a CircuitBreaker,
    id: &'a str,
    armed: bool,
}

impl AttemptGuard<'_> {
    fn complete(mut self, success: bool) {
        self.armed = false;
        if success {
            self.circuit.record_success(self.id);
        } else {
            self.circuit.record_failure(self.id);
        }
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                model = %self.id,
                error = %AgentError::Cancelled,
                "Attempt dropped before completion, recording failure"
            );
            self.circuit.record_failure(self.id);
        }
    }
}
