use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check: verifies the store answers.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.store().ping().await.map_err(|e| {
        tracing::error!(error = %e, "store health check failed");
        ApiError::Unavailable(format!("{} store unreachable", state.store().backend()))
    })?;

    Ok(Json(json!({
        "status": "ok",
        "store": state.store().backend(),
        "subscribers": state.event_bus().subscriber_count(),
    })))
}

/// Lightweight ping, no store check.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
