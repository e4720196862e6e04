//! Service metadata endpoints.

use axum::{extract::State, response::IntoResponse, Json};

use super::super::AppState;

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "app_name": state.app_name,
        "version": state.version,
    }))
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
