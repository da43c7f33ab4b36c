//! Shared test utilities for llm-router integration tests.
//!
//! Provides scripted provider adapters, a routing table with three ordered
//! candidates for `code`, and helpers to build an [`AppState`] around them.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use llm_router::agent::{AdapterMap, AgentError, ProviderAdapter};
use llm_router::api::types::ChatCompletionRequest;
use llm_router::api::{create_router, AppState};
use llm_router::circuit::{CircuitBreaker, CircuitBreakerConfig};
use llm_router::classifier::CategoryClassifier;
use llm_router::config::{CategoryConfig, RouterConfig};
use llm_router::metrics::MetricsCollector;
use llm_router::routing::{ConfigStore, ModelCandidate, Provider, RoutingEngine};
use llm_router::session::SessionTracker;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// =============================================================================
// Scripted provider
// =============================================================================

/// How a scripted model answers.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(&'static str),
    Fail(u16),
    Hang,
}

/// Adapter whose behaviour is scripted per model name. Unscripted models reply "ok".
pub struct ScriptedAdapter {
    provider: Provider,
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn call(
        &self,
        candidate: &ModelCandidate,
        _request: &ChatCompletionRequest,
        _timeout: Duration,
    ) -> Result<serde_json::Value, AgentError> {
        self.calls.lock().unwrap().push(candidate.id());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&candidate.model)
            .cloned()
            .unwrap_or(Script::Reply("ok"));

        match script {
            Script::Reply(text) => Ok(chat_completion(&candidate.model, text)),
            Script::Fail(status) => Err(AgentError::Upstream {
                status,
                message: format!("{} is down", candidate.model),
            }),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(AgentError::Cancelled)
            }
        }
    }
}

/// Minimal OpenAI-shaped completion body.
pub fn chat_completion(model: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

/// Handles into a scripted setup.
#[derive(Clone, Default)]
pub struct Scripts {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Scripts {
    pub fn set(&self, model: &str, script: Script) {
        self.scripts.lock().unwrap().insert(model.to_string(), script);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn adapters(&self) -> AdapterMap {
        let mut adapters: AdapterMap = HashMap::new();
        for provider in Provider::ALL {
            adapters.insert(
                provider,
                Arc::new(ScriptedAdapter {
                    provider,
                    scripts: self.scripts.clone(),
                    calls: self.calls.clone(),
                }),
            );
        }
        adapters
    }
}

// =============================================================================
// Configuration
// =============================================================================

pub fn candidate(model: &str) -> ModelCandidate {
    ModelCandidate::new(Provider::OpenRouter, model)
}

pub fn category(models: &[&str], keywords: &[&str]) -> CategoryConfig {
    CategoryConfig {
        models: models.iter().map(|m| candidate(m)).collect(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        description: None,
    }
}

/// Config with `code` -> [model-a, model-b, model-c] and `conversation` -> [chat-1].
pub fn test_config() -> RouterConfig {
    let mut categories = BTreeMap::new();
    categories.insert(
        "code".to_string(),
        category(&["model-a", "model-b", "model-c"], &["def ", "function", "```"]),
    );
    categories.insert(
        "reasoning".to_string(),
        category(&["thinker"], &["prove", "step by step"]),
    );
    categories.insert("conversation".to_string(), category(&["chat-1"], &[]));
    categories.insert("tools".to_string(), category(&["tool-model"], &[]));

    RouterConfig {
        categories,
        ..RouterConfig::default()
    }
}

// =============================================================================
// Engine and app builders
// =============================================================================

pub struct TestRouter {
    pub engine: Arc<RoutingEngine>,
    pub scripts: Scripts,
    pub metrics: Arc<MetricsCollector>,
}

pub fn test_engine(config: &RouterConfig) -> TestRouter {
    test_engine_with_circuit(config, CircuitBreaker::new(config.circuit_breaker.clone()))
}

pub fn test_engine_with_circuit(config: &RouterConfig, circuit: CircuitBreaker) -> TestRouter {
    let scripts = Scripts::default();
    let metrics = Arc::new(MetricsCollector::new(Instant::now(), None));
    let sessions = Arc::new(SessionTracker::new());

    let engine = RoutingEngine::new(
        Arc::new(ConfigStore::new(config.routing_table().unwrap())),
        CategoryClassifier::new(sessions),
        Arc::new(circuit),
        scripts.adapters(),
        metrics.clone(),
    )
    .with_attempt_timeout(Duration::from_millis(200));

    TestRouter {
        engine: Arc::new(engine),
        scripts,
        metrics,
    }
}

pub fn test_app(config: RouterConfig, config_path: Option<PathBuf>) -> (axum::Router, TestRouter) {
    let router = test_engine(&config);
    let state = Arc::new(AppState::new(
        router.engine.clone(),
        router.metrics.clone(),
        config,
        config_path,
    ));
    (create_router(state), router)
}

pub fn default_circuit() -> CircuitBreakerConfig {
    CircuitBreakerConfig::default()
}

// =============================================================================
// HTTP helpers
// =============================================================================

pub fn chat_request(text: &str) -> Request<Body> {
    json_request(
        "POST",
        "/v1/chat/completions",
        serde_json::json!({
            "model": "router",
            "messages": [{"role": "user", "content": text}]
        }),
    )
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
