pub mod order;
pub mod profile;

use axum::Json;
use serde_json::{Value, json};

/// Liveness endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "build": env!("GIT_HASH") }))
}
