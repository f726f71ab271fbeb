use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

/// Name reported by the health check
pub const SERVICE_NAME: &str = "geochat";

#[derive(Debug, Clone, Copy)]
pub struct HealthState {
    pub tools_ready: bool,
}

/// Health check handler
pub async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "tools_ready": state.tools_ready,
    }))
}
