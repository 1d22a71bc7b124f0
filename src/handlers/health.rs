use axum::extract::State;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /health - liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = state.store.health_check().await {
        tracing::warn!("Health check failed: {}", e);
        return Err(AppError::Unavailable(e));
    }

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "database": "ok"
    })))
}
