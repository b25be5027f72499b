use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::misc::elapsed_since;
use crate::state::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": elapsed_since(state.started_at),
        "tracked": state.gate.size(),
    }))
}
