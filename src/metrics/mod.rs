//! # Metrics Collection Module
//!
//! Receives one [`RoutingRecord`] per routed request and exposes it two ways:
//! - `GET /metrics` - Prometheus text format
//! - `GET /v1/stats` - JSON aggregates plus recent requests
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `llm_router_requests_total{category, source, model, status}`
//! - `llm_router_fallbacks_total{category}` - successes that needed more than one attempt
//! - `llm_router_circuit_open_total{model}` - circuits opened
//! - `llm_router_classifier_failures_total{stage}` - classifier stages that fell through
//!
//! **Histograms:**
//! - `llm_router_request_duration_seconds{category}`

pub mod handler;
pub mod history;
pub mod types;

pub use history::RequestHistory;
pub use types::*;

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Instant;

/// Number of history entries returned by [`MetricsCollector::stats`].
const RECENT_IN_STATS: usize = 10;

/// Receiver of routing outcomes. Implementations must not block.
pub trait MetricsSink: Send + Sync {
    fn record(&self, record: &RoutingRecord);
}

#[derive(Debug, Default)]
struct Aggregates {
    requests: RequestStats,
    total_latency_ms: f64,
    models: BTreeMap<String, u64>,
    categories: BTreeMap<String, u64>,
}

/// Prometheus-backed sink that also keeps in-memory aggregates.
pub struct MetricsCollector {
    start_time: Instant,
    aggregates: Mutex<Aggregates>,
    history: RequestHistory,
    /// Absent when no recorder is installed (tests, CLI)
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl MetricsCollector {
    pub fn new(
        start_time: Instant,
        prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
    ) -> Self {
        Self {
            start_time,
            aggregates: Mutex::new(Aggregates::default()),
            history: RequestHistory::new(),
            prometheus_handle,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn history(&self) -> &RequestHistory {
        &self.history
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle
            .as_ref()
            .map(|handle| handle.render())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> StatsResponse {
        let aggregates = self
            .aggregates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let avg = if aggregates.requests.total > 0 {
            aggregates.total_latency_ms / aggregates.requests.total as f64
        } else {
            0.0
        };

        StatsResponse {
            uptime_seconds: self.uptime_seconds(),
            requests: aggregates.requests,
            avg_latency_ms: (avg * 100.0).round() / 100.0,
            model_distribution: aggregates.models.clone(),
            category_distribution: aggregates.categories.clone(),
            recent_requests: self.history.recent(RECENT_IN_STATS),
        }
    }
}

impl MetricsSink for MetricsCollector {
    fn record(&self, record: &RoutingRecord) {
        let status = if record.success { "success" } else { "error" };
        metrics::counter!(
            "llm_router_requests_total",
            "category" => record.category.clone(),
            "source" => record.source.as_str(),
            "model" => record.model.clone(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "llm_router_request_duration_seconds",
            "category" => record.category.clone()
        )
        .record(record.latency.as_secs_f64());
        if record.success && record.attempts > 1 {
            metrics::counter!("llm_router_fallbacks_total", "category" => record.category.clone())
                .increment(1);
        }

        let latency_ms = record.latency.as_secs_f64() * 1000.0;
        {
            let mut aggregates = self
                .aggregates
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            aggregates.requests.total += 1;
            if record.success {
                aggregates.requests.success += 1;
            } else {
                aggregates.requests.failed += 1;
            }
            aggregates.total_latency_ms += latency_ms;
            *aggregates.models.entry(record.model.clone()).or_default() += 1;
            *aggregates
                .categories
                .entry(record.category.clone())
                .or_default() += 1;
        }

        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            category: record.category.clone(),
            source: record.source,
            model: record.model.clone(),
            latency_ms: (latency_ms * 100.0).round() / 100.0,
            success: record.success,
            error: record.error.clone(),
        });
    }
}

/// Initialize the Prometheus recorder with latency buckets in seconds.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let duration_buckets = &[
        0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("llm_router_request_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
