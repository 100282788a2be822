use axum::{extract::State, Json};
use serde_json::{json, Value};
use crate::api::AppState;

pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "Cadence Agent Engine API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "activities": "/api/activities",
            "agent_activities": "/api/activities/{agent_id}",
            "agents": "/api/agents",
            "stats": "/api/stats/{agent_id}",
            "engine": "/api/engine/status",
            "health": "/health",
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let engine = match &state.engine {
        Some(engine) if engine.is_stopping() => "stopping",
        Some(_) => "running",
        None => "detached",
    };

    Json(json!({
        "status": "healthy",
        "service": "cadence",
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": option_env!("CADENCE_GIT_HASH"),
        "build_timestamp": option_env!("CADENCE_BUILD_TIMESTAMP"),
        "storage": if state.db.is_some() { "initialized" } else { "not_initialized" },
        "engine": engine,
    }))
}
