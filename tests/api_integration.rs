//! Integration tests for the HTTP API.
//!
//! Requests go through the full axum router with scripted provider adapters.

mod common;

use axum::http::StatusCode;
use common::*;
use llm_router::config::RouterConfig;
use tower::ServiceExt;

// =============================================================================
// Chat completions
// =============================================================================

#[tokio::test]
async fn test_completion_passes_body_through_with_routing_headers() {
    let (app, router) = test_app(test_config(), None);
    router.scripts.set("model-a", Script::Reply("fn main() {}"));

    let response = app.oneshot(chat_request("def hello(): pass")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-router-category"], "code");
    assert_eq!(headers["x-router-source"], "keyword");
    assert_eq!(headers["x-router-model"], "openrouter:model-a");

    let body = body_json(response).await;
    assert_eq!(body, chat_completion("model-a", "fn main() {}"));
}

#[tokio::test]
async fn test_completion_alias_route() {
    let (app, _router) = test_app(test_config(), None);
    let mut request = chat_request("hello");
    *request.uri_mut() = "/chat/completions".parse().unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_completion_falls_over_and_reports_selected_model() {
    let (app, router) = test_app(test_config(), None);
    router.scripts.set("model-a", Script::Fail(500));

    let response = app.oneshot(chat_request("write a function")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-router-model"], "openrouter:model-b");
    assert_eq!(
        router.scripts.calls(),
        vec!["openrouter:model-a", "openrouter:model-b"]
    );
}

#[tokio::test]
async fn test_all_failed_returns_502_with_last_error() {
    let (app, router) = test_app(test_config(), None);
    for model in ["model-a", "model-b", "model-c"] {
        router.scripts.set(model, Script::Fail(500));
    }

    let response = app.oneshot(chat_request("def x")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("All models failed for category 'code'"));
    assert!(message.contains("model-c is down"));
    assert_eq!(body["error"]["type"], "server_error");
}

#[tokio::test]
async fn test_all_circuits_open_returns_503() {
    let (app, router) = test_app(test_config(), None);
    for _ in 0..3 {
        router.engine.circuit().record_failure("openrouter:chat-1");
    }

    let response = app.oneshot(chat_request("hi there friend")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(router.scripts.calls().is_empty());
}

#[tokio::test]
async fn test_user_field_is_session_id() {
    let (app, router) = test_app(test_config(), None);

    let request = json_request(
        "POST",
        "/v1/chat/completions",
        serde_json::json!({
            "messages": [{"role": "user", "content": "def x"}],
            "user": "alice"
        }),
    );
    app.clone().oneshot(request).await.unwrap();
    app.oneshot(chat_request("def y")).await.unwrap();

    let sessions = router.engine.sessions();
    assert_eq!(sessions.lookup("alice"), Some(candidate("model-a")));
    assert_eq!(sessions.lookup("default_session"), Some(candidate("model-a")));
}

#[tokio::test]
async fn test_invalid_json_returns_openai_error() {
    let (app, _router) = test_app(test_config(), None);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_empty_messages_rejected() {
    let (app, router) = test_app(test_config(), None);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/chat/completions",
            serde_json::json!({"messages": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(router.scripts.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = test_config();
    config.server.max_body_bytes = 1024;
    let (app, _router) = test_app(config, None);

    let body = serde_json::json!({
        "messages": [{"role": "user", "content": "x".repeat(4096)}]
    })
    .to_string();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Health, models, metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _router) = test_app(test_config(), None);

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "llm-router");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_models_lists_router_pseudo_model() {
    let (app, _router) = test_app(test_config(), None);

    for uri in ["/v1/models", "/models"] {
        let response = app.clone().oneshot(empty_request("GET", uri)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["object"], "list");
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], "router");
        assert_eq!(body["data"][0]["owned_by"], "local");
    }
}

#[tokio::test]
async fn test_stats_reflect_routed_requests() {
    let (app, router) = test_app(test_config(), None);
    router.scripts.set("chat-1", Script::Fail(503));

    app.clone().oneshot(chat_request("def x")).await.unwrap();
    app.clone().oneshot(chat_request("tell me a story")).await.unwrap();

    let response = app.oneshot(empty_request("GET", "/v1/stats")).await.unwrap();
    let stats = body_json(response).await;

    assert_eq!(stats["requests"]["total"], 2);
    assert_eq!(stats["requests"]["success"], 1);
    assert_eq!(stats["requests"]["failed"], 1);
    assert_eq!(stats["category_distribution"]["code"], 1);
    assert_eq!(stats["category_distribution"]["conversation"], 1);
    assert_eq!(stats["recent_requests"].as_array().unwrap().len(), 2);
    assert_eq!(stats["recent_requests"][1]["success"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_content_type() {
    let (app, _router) = test_app(test_config(), None);

    let response = app.oneshot(empty_request("GET", "/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; version=0.0.4; charset=utf-8"
    );
}

// =============================================================================
// Admin: configuration
// =============================================================================

#[tokio::test]
async fn test_get_config_shows_category_models() {
    let (app, _router) = test_app(test_config(), None);

    let response = app.oneshot(empty_request("GET", "/config")).await.unwrap();
    let body = body_json(response).await;

    assert_eq!(body["mode"], "keywords");
    assert_eq!(
        body["categories"]["code"],
        serde_json::json!([
            "openrouter:model-a",
            "openrouter:model-b",
            "openrouter:model-c"
        ])
    );
    assert_eq!(body["failure_threshold"], 3);
}

#[tokio::test]
async fn test_put_category_takes_effect_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("router.toml");
    let config = test_config();
    config.save(&path).unwrap();

    let (app, router) = test_app(config, Some(path.clone()));

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/config/categories/translation",
            serde_json::json!({
                "models": ["openai:gpt-4o-mini"],
                "keywords": ["translate"],
                "description": "Translation between languages"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(chat_request("please translate this into French"))
        .await
        .unwrap();
    assert_eq!(response.headers()["x-router-category"], "translation");
    assert_eq!(router.scripts.calls(), vec!["openai:gpt-4o-mini"]);

    let saved = RouterConfig::load(Some(&path)).unwrap();
    assert_eq!(
        saved.categories["translation"].keywords,
        vec!["translate".to_string()]
    );
}

#[tokio::test]
async fn test_put_category_rejects_empty_models() {
    let (app, _router) = test_app(test_config(), None);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/config/categories/empty",
            serde_json::json!({"models": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_category() {
    let (app, router) = test_app(test_config(), None);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/config/categories/reasoning"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!router
        .engine
        .config_store()
        .snapshot()
        .categories
        .contains_key("reasoning"));

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/config/categories/reasoning"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("DELETE", "/config/categories/conversation"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reload_publishes_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("router.toml");
    let config = test_config();
    config.save(&path).unwrap();

    let (app, router) = test_app(config.clone(), Some(path.clone()));

    let mut edited = config;
    edited.categories.get_mut("code").unwrap().models = vec![candidate("model-z")];
    edited.save(&path).unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/config/reload"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "reloaded");

    app.oneshot(chat_request("def x")).await.unwrap();
    assert_eq!(router.scripts.calls(), vec!["openrouter:model-z"]);
}

#[tokio::test]
async fn test_reload_without_file_is_rejected() {
    let (app, _router) = test_app(test_config(), None);
    let response = app
        .oneshot(empty_request("POST", "/config/reload"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reload_invalid_file_keeps_running_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("router.toml");
    let config = test_config();
    config.save(&path).unwrap();
    let (app, router) = test_app(config, Some(path.clone()));

    std::fs::write(&path, "[categories.code]\nmodels = []\n").unwrap();
    let response = app
        .oneshot(empty_request("POST", "/config/reload"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        router.engine.config_store().snapshot().categories["code"].models.len(),
        3
    );
}

// =============================================================================
// Admin: circuit breaker
// =============================================================================

#[tokio::test]
async fn test_circuit_status_and_reset() {
    let (app, router) = test_app(test_config(), None);
    let circuit = router.engine.circuit();
    for _ in 0..3 {
        circuit.record_failure("openrouter:z-ai/glm-5");
    }
    circuit.record_failure("openrouter:model-b");

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/circuit-breaker"))
        .await
        .unwrap();
    let status = body_json(response).await;
    assert_eq!(status["failures"]["openrouter:z-ai/glm-5"], 3);
    assert_eq!(status["open"], serde_json::json!(["openrouter:z-ai/glm-5"]));

    let response = app
        .clone()
        .oneshot(empty_request(
            "POST",
            "/circuit-breaker/reset/openrouter:z-ai/glm-5",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(circuit.is_available("openrouter:z-ai/glm-5"));

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/circuit-breaker/reset/openrouter:never-seen"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("POST", "/circuit-breaker/reset-all"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(circuit.status().failures.is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _router) = test_app(test_config(), None);
    let response = app
        .oneshot(empty_request("GET", "/unknown/path"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
