use std::path::PathBuf;
use std::sync::Arc;
use console::style;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::api::{self, AppState};
use crate::cli::commands::RunArgs;
use crate::cli::table::print_status_table;
use crate::client;
use crate::config::{self, credentials::mask_secret, StorageSpec};
use crate::db::Database;
use crate::engine::{ActivityRecorder, NullRecorder, Scheduler};
use crate::errors::EngineError;
use tracing::{error, info, warn};

pub async fn handle_run(args: RunArgs) -> Result<(), EngineError> {
    let loaded = config::parse_config(&PathBuf::from(&args.config)).await?;
    info!(
        base_url = %loaded.engine.base_url,
        api_key = %mask_secret(&loaded.engine.api_key),
        agents = loaded.engine.agents.len(),
        "Configuration loaded"
    );

    let db = open_storage(&loaded.storage);
    let recorder: Arc<dyn ActivityRecorder> = match &db {
        Some(db) => Arc::new(db.clone()),
        None => Arc::new(NullRecorder),
    };

    let client = client::create_client(&loaded.engine);
    let scheduler = Arc::new(Scheduler::new(loaded.engine, client, recorder));

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = if args.api {
        if db.is_none() {
            warn!("Activity storage is disabled, activity endpoints will answer 503");
        }
        let state = AppState::new(db.clone()).with_engine(scheduler.clone());
        let server_shutdown = shutdown.clone();
        let host = args.api_host.clone();
        let port = args.api_port;
        println!(
            "{} {}",
            style("API server running on").cyan().bold(),
            style(format!("http://{}:{}", host, port)).cyan()
        );
        Some(tokio::spawn(async move {
            if let Err(e) = api::serve(state, &host, port, server_shutdown).await {
                error!(error = %e, "API server failed");
            }
        }))
    } else {
        None
    };

    print_banner(&scheduler, &args.agents);
    let subset = (!args.agents.is_empty()).then_some(args.agents.as_slice());
    let result = scheduler.start(subset, shutdown.clone()).await;

    // Runners may also end on their own; take the API down with them
    shutdown.cancel();
    if let Some(server) = server {
        join_server(server).await;
    }

    let mut snapshots: Vec<_> = scheduler.status().into_values().collect();
    if !snapshots.is_empty() {
        snapshots.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        print_status_table(&snapshots);
    }
    println!("{}", style("Engine stopped").green());
    result
}

/// Storage problems never stop the engine; cycles just go unrecorded.
/// Wait for the API task. Returns false if it panicked or was cancelled.
async fn join_server(server: JoinHandle<()>) -> bool {
    match server.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, panicked = e.is_panic(), "API server task ended abnormally");
            false
        }
    }
}

fn open_storage(spec: &StorageSpec) -> Option<Database> {
    if !spec.enabled {
        info!("Activity storage disabled");
        return None;
    }
    match Database::new(&spec.database_path) {
        Ok(db) => {
            info!(path = %spec.database_path, "Activity storage enabled");
            Some(db)
        }
        Err(e) => {
            warn!(error = %e, "Failed to initialize activity storage, activities will not be stored");
            None
        }
    }
}

fn print_banner(scheduler: &Scheduler, requested: &[String]) {
    let subset = (!requested.is_empty()).then_some(requested);
    let selected = scheduler.select_agents(subset);
    println!("\n{}", style("Cadence - Activating Agents").cyan().bold());
    if selected.is_empty() {
        println!("{}", style("No agents to run!").red());
        return;
    }
    println!("{}", style(format!("Found {} agent(s):", selected.len())).cyan());
    for agent in &selected {
        println!("  • {} (cycle: {:.1}min)", agent.name, agent.interval.as_secs_f64() / 60.0);
    }
    println!("{}\n", style("Press Ctrl+C to deactivate").dim());
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received interrupt, shutting down"),
                    _ = term.recv() => info!("Received SIGTERM, shutting down"),
                    _ = shutdown.cancelled() => return,
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not install SIGTERM handler");
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received interrupt, shutting down"),
                    _ = shutdown.cancelled() => return,
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received interrupt, shutting down"),
            _ = shutdown.cancelled() => return,
        }
    }
    shutdown.cancel();
}
