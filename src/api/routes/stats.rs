use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use crate::api::AppState;
use crate::api::errors::{bad_request, error_response, ApiError};
use super::storage;

pub const DEFAULT_STATS_DAYS: i64 = 7;
pub const MAX_STATS_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub days: Option<i64>,
}

pub async fn agent_stats(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    let days = params.days.unwrap_or(DEFAULT_STATS_DAYS);
    if !(1..=MAX_STATS_DAYS).contains(&days) {
        return Err(bad_request(format!("days must be between 1 and {}", MAX_STATS_DAYS)));
    }

    let db = storage(&state.db)?;
    db.get_agent_stats(&agent_id, days as u32)
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, agent_id = %agent_id, "Error getting agent stats");
            error_response(&e)
        })
}
