//! Models listing endpoint handler.

use crate::api::{ModelObject, ModelsResponse};
use axum::Json;

/// Fixed creation timestamp of the pseudo-model.
const ROUTER_MODEL_CREATED: i64 = 1_700_000_000;

/// GET /v1/models - Clients see one model, `router`; backends stay hidden.
pub async fn handle() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        object: "list".to_string(),
        data: vec![ModelObject {
            id: "router".to_string(),
            object: "model".to_string(),
            created: ROUTER_MODEL_CREATED,
            owned_by: "local".to_string(),
        }],
    })
}
