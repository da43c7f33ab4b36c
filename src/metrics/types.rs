//! # Metrics Types
//!
//! Routing records and the JSON shapes served by `GET /v1/stats`.

use crate::routing::RoutingSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One completed routing attempt, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingRecord {
    pub category: String,
    pub source: RoutingSource,
    /// Selected model on success, last attempted model on failure
    pub model: String,
    pub success: bool,
    pub latency: Duration,
    /// Candidates actually called
    pub attempts: u32,
    pub error: Option<String>,
}

/// Entry in the recent-requests ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub source: RoutingSource,
    pub model: String,
    pub latency_ms: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON response for GET /v1/stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    pub requests: RequestStats,
    /// Mean latency over all requests, rounded to two decimals
    pub avg_latency_ms: f64,
    pub model_distribution: BTreeMap<String, u64>,
    pub category_distribution: BTreeMap<String, u64>,
    /// Most recent requests, oldest first
    pub recent_requests: Vec<HistoryEntry>,
}

/// Aggregate request statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
}
