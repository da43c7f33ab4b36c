//! Per-model circuit state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Failure-tracking state for a single model candidate.
///
/// The serialized field names are the persisted format:
/// `{"failures": 3, "last_failure_time": "...", "is_open": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitState {
    /// Count of consecutive failed calls
    #[serde(rename = "failures")]
    pub consecutive_failures: u32,
    /// When the most recent failure was recorded
    #[serde(default)]
    pub last_failure_time: Option<DateTime<Utc>>,
    /// Whether the circuit is currently open
    #[serde(default)]
    pub is_open: bool,
}

impl CircuitState {
    /// Whether a call may be attempted at `now`.
    ///
    /// An open circuit lets calls through again once `recovery` has elapsed
    /// since the last failure. Every such check passes; there is no
    /// single-trial gating.
    pub fn is_available_at(&self, now: DateTime<Utc>, recovery: Duration) -> bool {
        if !self.is_open {
            return true;
        }
        match self.last_failure_time {
            Some(last) => now - last > recovery,
            None => true,
        }
    }

    /// Apply a failed call. Returns true if this failure opened the circuit.
    pub fn apply_failure(&mut self, now: DateTime<Utc>, threshold: u32) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure_time = Some(now);

        if !self.is_open && self.consecutive_failures >= threshold {
            self.is_open = true;
            return true;
        }
        false
    }

    /// Apply a successful call. Returns true if the state changed.
    pub fn apply_success(&mut self) -> bool {
        let changed = self.consecutive_failures != 0 || self.is_open;
        self.consecutive_failures = 0;
        self.is_open = false;
        changed
    }
}
