use axum::{extract::State, Json};
use serde_json::Value;
use crate::api::AppState;
use crate::api::errors::{error_response, ApiError};
use super::storage;

pub async fn list_agents(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db = storage(&state.db)?;
    db.get_agents()
        .map(|agents| Json(Value::Array(agents)))
        .map_err(|e| {
            tracing::error!(error = %e, "Error getting agents");
            error_response(&e)
        })
}
