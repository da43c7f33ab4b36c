//! Admin endpoints: routing configuration and circuit breaker control.
//!
//! Configuration edits follow one sequence under the config lock: apply to a
//! copy, validate, build the routing table, persist (when loaded from a
//! file), then publish. A failure at any step leaves the running router
//! untouched.

use crate::api::{ApiError, AppState};
use crate::circuit::CircuitStatus;
use crate::classifier::FALLBACK_CATEGORY;
use crate::config::{validate_category, CategoryConfig, RouterConfig, RoutingMode};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Active routing configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub mode: RoutingMode,
    pub default_model: String,
    /// Category name to ordered model ids
    pub categories: BTreeMap<String, Vec<String>>,
    pub failure_threshold: u32,
    pub recovery_timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl AdminResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            target: None,
            categories: Vec::new(),
        }
    }

    fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }
}

/// GET /config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigSummary> {
    let table = state.engine.config_store().snapshot();
    let circuit = state.engine.circuit().config();

    Json(ConfigSummary {
        mode: table.mode,
        default_model: table.default_model.id(),
        categories: table
            .categories
            .iter()
            .map(|(name, category)| {
                (
                    name.clone(),
                    category.models.iter().map(|m| m.id()).collect(),
                )
            })
            .collect(),
        failure_threshold: circuit.failure_threshold,
        recovery_timeout_seconds: circuit.recovery_timeout_seconds,
    })
}

/// POST /config/reload - Re-read the config file and publish its routing table.
///
/// Only routing data (mode, default model, categories, continuation) is
/// reloaded. Server, provider and circuit settings need a restart.
pub async fn reload_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminResponse>, ApiError> {
    let path = state
        .config_path
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("router was started without a config file"))?;

    let mut current = state.config.lock().await;
    let reloaded = RouterConfig::load(Some(path))?.with_env_overrides();
    reloaded.validate()?;
    let table = reloaded.routing_table()?;
    let categories: Vec<String> = table.categories.keys().cloned().collect();

    state.engine.config_store().publish(table);
    *current = reloaded;

    info!(path = %path.display(), categories = categories.len(), "Configuration reloaded");
    Ok(Json(
        AdminResponse::new("reloaded").with_categories(categories),
    ))
}

/// PUT /config/categories/:name - Add or replace a category.
pub async fn put_category(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(category): Json<CategoryConfig>,
) -> Result<Json<AdminResponse>, ApiError> {
    validate_category(&name, &category)?;

    let mut current = state.config.lock().await;
    let mut updated = current.clone();
    updated.categories.insert(name.clone(), category);
    commit(&state, &mut current, updated)?;

    info!(category = %name, "Category updated");
    Ok(Json(AdminResponse::new("updated").with_target(name)))
}

/// DELETE /config/categories/:name
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AdminResponse>, ApiError> {
    if name == FALLBACK_CATEGORY {
        return Err(ApiError::bad_request(&format!(
            "category '{}' is the fallback and cannot be deleted",
            FALLBACK_CATEGORY
        )));
    }

    let mut current = state.config.lock().await;
    if !current.categories.contains_key(&name) {
        return Err(ApiError::not_found(&format!("category '{}' not found", name)));
    }
    let mut updated = current.clone();
    updated.categories.remove(&name);
    commit(&state, &mut current, updated)?;

    info!(category = %name, "Category deleted");
    Ok(Json(AdminResponse::new("deleted").with_target(name)))
}

fn commit(
    state: &AppState,
    current: &mut RouterConfig,
    updated: RouterConfig,
) -> Result<(), ApiError> {
    updated.validate()?;
    let table = updated.routing_table()?;
    if let Some(path) = &state.config_path {
        updated.save(path)?;
    }
    state.engine.config_store().publish(table);
    *current = updated;
    Ok(())
}

/// GET /circuit-breaker
pub async fn circuit_status(State(state): State<Arc<AppState>>) -> Json<CircuitStatus> {
    Json(state.engine.circuit().status())
}

/// POST /circuit-breaker/reset/*model - Model ids contain `/`, hence the wildcard.
pub async fn reset_circuit(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> Result<Json<AdminResponse>, ApiError> {
    let model = model.trim_start_matches('/').to_string();
    if !state.engine.circuit().reset(&model) {
        return Err(ApiError::not_found(&format!(
            "no circuit state for model '{}'",
            model
        )));
    }
    info!(model = %model, "Circuit reset");
    Ok(Json(AdminResponse::new("reset").with_target(model)))
}

/// POST /circuit-breaker/reset-all
pub async fn reset_all_circuits(State(state): State<Arc<AppState>>) -> Json<AdminResponse> {
    state.engine.circuit().reset_all();
    info!("All circuits reset");
    Json(AdminResponse::new("reset"))
}
