//! Health check endpoints

use axum::{extract::State, Json};
use serde_json::json;

use fuel_ledger::RewardStorage;

use crate::error::ApiResult;
use crate::state::AppState;

/// Liveness check
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "fuel-api",
    }))
}

/// Readiness check: verifies the storage answers
pub async fn ready_check<S: RewardStorage>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<serde_json::Value>> {
    let stats = state.ledger.storage_stats().await?;

    Ok(Json(json!({
        "status": "ready",
        "version": state.version,
        "storage": stats,
        "metrics": state.ledger.metrics().snapshot(),
    })))
}
