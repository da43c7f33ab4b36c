//! Circuit breaking for model candidates.
//!
//! Each candidate gets a lazily created [`CircuitState`] keyed by its id.
//! After `failure_threshold` consecutive failures the circuit opens and the
//! candidate is skipped until `recovery_timeout` has passed since its last
//! failure. A single success closes the circuit completely.

mod config;
mod state;
mod store;


pub use config::*;
pub use state::*;
pub use store::*;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Longest recovery timeout representable without overflowing `chrono`.
const MAX_RECOVERY_SECONDS: u64 = 10 * 365 * 24 * 3600;

/// Read-only view of the breaker for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CircuitStatus {
    /// Candidates with a non-zero consecutive failure count
    pub failures: BTreeMap<String, u32>,
    /// Candidates whose circuit is currently open (sorted)
    pub open: Vec<String>,
}

/// Per-candidate circuit breaker shared by all in-flight requests.
///
/// State lives in a `DashMap`, so read-modify-write of one candidate's state
/// is atomic with respect to concurrent requests touching the same key.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    recovery: chrono::Duration,
    states: DashMap<String, CircuitState>,
    persistence: Option<Arc<Persistence>>,
}

/// Background persistence of the state table.
///
/// Snapshots are numbered in the order they were taken. A write whose
/// number is not newer than the last one written is dropped, so the file
/// always ends on the newest state regardless of the order blocking tasks run.
struct Persistence {
    store: Arc<dyn CircuitStore>,
    /// Taken while numbering a snapshot, so numbers follow table order
    snapshot_lock: Mutex<()>,
    generation: AtomicU64,
    /// Number of the last snapshot handed to the store
    written: Mutex<u64>,
    pending: AtomicUsize,
    idle: Notify,
}

impl Persistence {
    fn new(store: Arc<dyn CircuitStore>) -> Self {
        Self {
            store,
            snapshot_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            written: Mutex::new(0),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    fn write(&self, generation: u64, table: &HashMap<String, CircuitState>) {
        let mut written = self
            .written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if generation <= *written {
            return;
        }
        *written = generation;
        if let Err(e) = self.store.save(table) {
            tracing::warn!(error = %e, "Failed to persist circuit state");
        }
    }

    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl CircuitBreaker {
    /// Create an in-memory breaker with no persistence.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::from_snapshot(config, HashMap::new())
    }

    /// Create a breaker seeded from a previously taken [`snapshot`](Self::snapshot).
    pub fn from_snapshot(
        config: CircuitBreakerConfig,
        table: HashMap<String, CircuitState>,
    ) -> Self {
        let recovery_secs = config.recovery_timeout_seconds.min(MAX_RECOVERY_SECONDS) as i64;
        Self {
            recovery: chrono::Duration::seconds(recovery_secs),
            config,
            states: table.into_iter().collect(),
            persistence: None,
        }
    }

    /// Create a breaker backed by `store`, loading its state once.
    pub fn with_store(
        config: CircuitBreakerConfig,
        store: Arc<dyn CircuitStore>,
    ) -> Result<Self, CircuitStoreError> {
        let table = store.load()?;
        tracing::info!(entries = table.len(), "Loaded persisted circuit state");

        let mut breaker = Self::from_snapshot(config, table);
        breaker.persistence = Some(Arc::new(Persistence::new(store)));
        Ok(breaker)
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Whether a call to `candidate` should be attempted now. Never mutates state.
    pub fn is_available(&self, candidate: &str) -> bool {
        self.is_available_at(candidate, Utc::now())
    }

    /// [`is_available`](Self::is_available) evaluated at a fixed instant.
    pub fn is_available_at(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        self.states
            .get(candidate)
            .map(|state| state.is_available_at(now, self.recovery))
            .unwrap_or(true)
    }

    /// Record a failed call to `candidate`.
    pub fn record_failure(&self, candidate: &str) {
        self.record_failure_at(candidate, Utc::now());
    }

    /// [`record_failure`](Self::record_failure) with an explicit timestamp.
    pub fn record_failure_at(&self, candidate: &str, now: DateTime<Utc>) {
        let (opened, failures) = {
            let mut state = self.states.entry(candidate.to_string()).or_default();
            let opened = state.apply_failure(now, self.config.failure_threshold);
            (opened, state.consecutive_failures)
        };

        if opened {
            tracing::warn!(
                candidate,
                failures,
                recovery_timeout_seconds = self.config.recovery_timeout_seconds,
                "Circuit opened"
            );
            metrics::counter!("llm_router_circuit_open_total", "model" => candidate.to_string())
                .increment(1);
        } else {
            tracing::debug!(candidate, failures, "Recorded failure");
        }

        self.persist();
    }

    /// Record a successful call to `candidate`, fully closing its circuit.
    pub fn record_success(&self, candidate: &str) {
        let changed = {
            let mut state = self.states.entry(candidate.to_string()).or_default();
            state.apply_success()
        };

        if changed {
            tracing::info!(candidate, "Circuit closed");
            self.persist();
        }
    }

    /// Administratively close one circuit. Returns false if the candidate was never seen.
    pub fn reset(&self, candidate: &str) -> bool {
        let changed = match self.states.get_mut(candidate) {
            Some(mut state) => state.apply_success(),
            None => return false,
        };

        if changed {
            tracing::info!(candidate, "Circuit reset");
            self.persist();
        }
        true
    }

    /// Administratively close every circuit.
    pub fn reset_all(&self) {
        let mut changed = false;
        for mut entry in self.states.iter_mut() {
            changed |= entry.value_mut().apply_success();
        }

        if changed {
            tracing::info!("All circuits reset");
            self.persist();
        }
    }

    /// Non-zero failure counts and open circuits.
    pub fn status(&self) -> CircuitStatus {
        let mut status = CircuitStatus::default();
        for entry in self.states.iter() {
            let state = entry.value();
            if state.consecutive_failures > 0 {
                status
                    .failures
                    .insert(entry.key().clone(), state.consecutive_failures);
            }
            if state.is_open {
                status.open.push(entry.key().clone());
            }
        }
        status.open.sort();
        status
    }

    /// Full state table, in the flat format used for persistence.
    pub fn snapshot(&self) -> HashMap<String, CircuitState> {
        self.states
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Wait until every snapshot handed to the store has been written.
    pub async fn flush(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };

        loop {
            let idle = persistence.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if persistence.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Hand the current table to the store. Must not be called while holding a map guard.
    ///
    /// Inside a tokio runtime the write runs on the blocking pool and this
    /// returns immediately; outside one it is written inline.
    fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };

        let (generation, table) = {
            let _guard = persistence
                .snapshot_lock
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let generation = persistence.generation.fetch_add(1, Ordering::AcqRel) + 1;
            (generation, self.snapshot())
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                persistence.pending.fetch_add(1, Ordering::AcqRel);
                let persistence = Arc::clone(persistence);
                handle.spawn_blocking(move || {
                    persistence.write(generation, &table);
                    persistence.finish_one();
                });
            }
            Err(_) => persistence.write(generation, &table),
        }
    }
}
