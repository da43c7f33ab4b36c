//! Chat completions endpoint handler.

use crate::api::{
    ApiError, AppState, ChatCompletionRequest, CATEGORY_HEADER, MODEL_HEADER, SOURCE_HEADER,
};
use crate::session::DEFAULT_SESSION_ID;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// POST /v1/chat/completions - Route a chat completion request.
///
/// The provider's JSON body is returned unchanged; routing details travel in
/// `x-router-*` headers.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(&e.body_text()))?;

    if request.messages.is_empty() {
        return Err(ApiError::bad_request("'messages' must contain at least one message"));
    }
    if request.stream {
        debug!("Streaming requested, responding with a single non-streamed body");
    }

    let session_id = request
        .user
        .as_deref()
        .filter(|user| !user.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string();

    let outcome = state
        .engine
        .route(&request, &session_id)
        .await
        .map_err(|e| {
            warn!(error = %e, "Chat completion failed");
            ApiError::from(e)
        })?;

    let mut response = Json(outcome.response).into_response();
    let headers = response.headers_mut();
    for (name, value) in [
        (CATEGORY_HEADER, outcome.decision.category.clone()),
        (SOURCE_HEADER, outcome.decision.source.to_string()),
        (MODEL_HEADER, outcome.selected.id()),
    ] {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }

    Ok(response)
}
