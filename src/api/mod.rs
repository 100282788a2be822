pub mod errors;
pub mod routes;

use std::sync::Arc;
use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::db::Database;
use crate::engine::Scheduler;

/// Shared by every handler. Storage is absent when it is disabled in the
/// config; the engine is absent when the API runs without a scheduler.
#[derive(Clone, Default)]
pub struct AppState {
    pub db: Option<Database>,
    pub engine: Option<Arc<Scheduler>>,
}

impl AppState {
    pub fn new(db: Option<Database>) -> Self {
        Self { db, engine: None }
    }

    pub fn with_engine(mut self, engine: Arc<Scheduler>) -> Self {
        self.engine = Some(engine);
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::health::index))
        .route("/health", get(routes::health::health_check))
        .route("/api/activities", get(routes::activities::list_activities))
        .route("/api/activities/{agent_id}", get(routes::activities::agent_activities))
        .route("/api/agents", get(routes::agents::list_agents))
        .route("/api/stats/{agent_id}", get(routes::stats::agent_stats))
        .route("/api/engine/status", get(routes::engine::engine_status))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Bind and serve until `shutdown` fires.
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: tokio_util::sync::CancellationToken,
) -> Result<(), crate::errors::EngineError> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "API server listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
