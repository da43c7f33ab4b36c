//! Request history ring buffer
//!
//! Keeps the last completed routing attempts for `GET /v1/stats`.

use super::HistoryEntry;
use std::collections::VecDeque;
use std::sync::RwLock;

/// Default number of entries kept.
pub const HISTORY_CAPACITY: usize = 100;

/// Longest error message stored per entry.
const MAX_ERROR_LEN: usize = 1024;

/// Ring buffer of recent requests, evicting the oldest when full
pub struct RequestHistory {
    entries: RwLock<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, mut entry: HistoryEntry) {
        if let Some(error) = entry.error.as_mut() {
            if error.len() > MAX_ERROR_LEN {
                let mut cut = MAX_ERROR_LEN;
                while !error.is_char_boundary(cut) {
                    cut -= 1;
                }
                error.truncate(cut);
            }
        }

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new()
    }
}
