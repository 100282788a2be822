use tokio_util::sync::CancellationToken;
use crate::api::{self, AppState};
use crate::cli::commands::ServeArgs;
use crate::db::Database;
use crate::errors::EngineError;
use tracing::info;

pub async fn handle_serve(args: ServeArgs) -> Result<(), EngineError> {
    info!(host = %args.host, port = args.port, db = %args.db, "Starting API server");

    let db = Database::new(&args.db)?;
    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, shutting down");
        }
        on_signal.cancel();
    });

    api::serve(AppState::new(Some(db)), &args.host, args.port, shutdown).await
}
