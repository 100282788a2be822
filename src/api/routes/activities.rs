use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use crate::api::AppState;
use crate::api::errors::{bad_request, error_response, ApiError};
use crate::db::ActivityQuery;
use crate::db::activities::DEFAULT_PAGE_SIZE;
use super::storage;

pub const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Deserialize, Default)]
pub struct ActivitiesParams {
    pub agent_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub hours: Option<i64>,
}

impl ActivitiesParams {
    /// Range-check the raw parameters and turn them into a store query.
    pub fn into_query(self, agent_id: Option<String>) -> Result<ActivityQuery, ApiError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE as i64);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(bad_request(format!("limit must be between 1 and {}", MAX_PAGE_SIZE)));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(bad_request("offset must not be negative"));
        }
        let start = match self.hours {
            Some(h) if h < 1 => return Err(bad_request("hours must be at least 1")),
            Some(h) => Some(
                Duration::try_hours(h)
                    .and_then(|d| Utc::now().checked_sub_signed(d))
                    .ok_or_else(|| bad_request("hours is too large"))?,
            ),
            None => None,
        };

        Ok(ActivityQuery {
            agent_id: agent_id.or(self.agent_id).filter(|id| !id.is_empty()),
            limit: limit as usize,
            offset: offset as usize,
            start,
            end: None,
        })
    }
}

fn parse_params(
    params: Result<Query<ActivitiesParams>, QueryRejection>,
) -> Result<ActivitiesParams, ApiError> {
    params
        .map(|Query(p)| p)
        .map_err(|e| bad_request(e.body_text()))
}

pub async fn list_activities(
    State(state): State<AppState>,
    params: Result<Query<ActivitiesParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let query = parse_params(params)?.into_query(None)?;
    let db = storage(&state.db)?;
    let activities = db.get_activities(&query).map_err(|e| {
        tracing::error!(error = %e, "Error getting activities");
        error_response(&e)
    })?;
    Ok(Json(Value::Array(activities)))
}

pub async fn agent_activities(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    params: Result<Query<ActivitiesParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let query = parse_params(params)?.into_query(Some(agent_id))?;
    let db = storage(&state.db)?;
    let activities = db.get_activities(&query).map_err(|e| {
        tracing::error!(error = %e, "Error getting agent activities");
        error_response(&e)
    })?;
    Ok(Json(Value::Array(activities)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = ActivitiesParams::default().into_query(None).unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 0);
        assert!(query.start.is_none());
        assert!(query.agent_id.is_none());
    }

    #[test]
    fn test_path_agent_wins() {
        let params = ActivitiesParams { agent_id: Some("q".into()), ..Default::default() };
        let query = params.into_query(Some("p".into())).unwrap();
        assert_eq!(query.agent_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_out_of_range() {
        for params in [
            ActivitiesParams { limit: Some(0), ..Default::default() },
            ActivitiesParams { limit: Some(1001), ..Default::default() },
            ActivitiesParams { offset: Some(-1), ..Default::default() },
            ActivitiesParams { hours: Some(0), ..Default::default() },
        ] {
            assert!(params.into_query(None).is_err());
        }
    }

    #[test]
    fn test_hours_sets_start() {
        let params = ActivitiesParams { hours: Some(2), ..Default::default() };
        let start = params.into_query(None).unwrap().start.unwrap();
        let age = Utc::now() - start;
        assert!(age >= Duration::hours(2) && age < Duration::hours(2) + Duration::minutes(1));
    }
}
