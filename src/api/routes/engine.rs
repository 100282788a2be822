use axum::{extract::State, Json};
use serde_json::{json, Value};
use crate::api::AppState;
use crate::api::errors::{unavailable, ApiError};

/// Live runner snapshots, straight from the scheduler rather than storage.
pub async fn engine_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let engine = state.engine.as_ref().ok_or_else(|| unavailable("Engine not attached"))?;
    Ok(Json(json!({
        "stopping": engine.is_stopping(),
        "summary": engine.summary(),
        "agents": engine.status(),
    })))
}
