//! # HTTP API
//!
//! OpenAI-compatible front door for the router, plus admin endpoints.
//!
//! ## Endpoints
//!
//! - `POST /v1/chat/completions` (alias `/chat/completions`) - Classify, route, proxy
//! - `GET /v1/models` (alias `/models`) - The single `router` pseudo-model
//! - `GET /health` - Liveness and uptime
//! - `GET /metrics` - Prometheus metrics
//! - `GET /v1/stats` - JSON request statistics
//! - `GET /config` - Active routing table
//! - `POST /config/reload` - Re-read the config file and publish a new snapshot
//! - `PUT|DELETE /config/categories/:name` - Edit categories at runtime
//! - `GET /circuit-breaker` - Failure counts and open circuits
//! - `POST /circuit-breaker/reset/*model`, `POST /circuit-breaker/reset-all`
//!
//! ## Example
//!
//! ```no_run
//! use llm_router::api::{create_router, AppState};
//! use llm_router::cli::serve::build_engine;
//! use llm_router::config::RouterConfig;
//! use llm_router::metrics::MetricsCollector;
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RouterConfig::default();
//! let metrics = Arc::new(MetricsCollector::new(Instant::now(), None));
//! let engine = build_engine(&config, reqwest::Client::new(), metrics.clone())?;
//!
//! let state = Arc::new(AppState::new(Arc::new(engine), metrics, config, None));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3456").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All errors are returned in OpenAI-compatible format:
//! ```json
//! {
//!   "error": {
//!     "message": "All models failed for category 'code'. Last error: ...",
//!     "type": "server_error",
//!     "code": "bad_gateway"
//!   }
//! }
//! ```

mod admin;
mod completions;
mod health;
mod models;
pub mod types;

pub use health::HealthResponse;
pub use types::*;

use crate::config::RouterConfig;
use crate::metrics::MetricsCollector;
use crate::routing::RoutingEngine;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Response headers describing how a request was routed.
pub const CATEGORY_HEADER: &str = "x-router-category";
pub const SOURCE_HEADER: &str = "x-router-source";
pub const MODEL_HEADER: &str = "x-router-model";

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub engine: Arc<RoutingEngine>,
    pub metrics: Arc<MetricsCollector>,
    /// Current file-level configuration; admin edits hold this lock
    /// across validate, save and publish
    pub config: Mutex<RouterConfig>,
    /// File the configuration was loaded from, if any
    pub config_path: Option<PathBuf>,
    pub start_time: Instant,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<RoutingEngine>,
        metrics: Arc<MetricsCollector>,
        config: RouterConfig,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            engine,
            metrics,
            max_body_bytes: config.server.max_body_bytes,
            config: Mutex::new(config),
            config_path,
            start_time: Instant::now(),
        }
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/v1/chat/completions", post(completions::handle))
        .route("/chat/completions", post(completions::handle))
        .route("/v1/models", get(models::handle))
        .route("/models", get(models::handle))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .route("/v1/stats", get(crate::metrics::handler::stats_handler))
        .route("/config", get(admin::get_config))
        .route("/config/reload", post(admin::reload_config))
        .route(
            "/config/categories/:name",
            put(admin::put_category).delete(admin::delete_category),
        )
        .route("/circuit-breaker", get(admin::circuit_status))
        .route("/circuit-breaker/reset-all", post(admin::reset_all_circuits))
        .route("/circuit-breaker/reset/*model", post(admin::reset_circuit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
