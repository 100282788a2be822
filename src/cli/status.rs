use std::collections::HashMap;
use console::style;
use crate::cli::commands::StatusArgs;
use crate::cli::table::print_status_table;
use crate::engine::{EngineSummary, RunnerSnapshot};
use crate::errors::EngineError;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct EngineStatusBody {
    stopping: bool,
    agents: HashMap<String, RunnerSnapshot>,
}

pub async fn handle_status(args: StatusArgs) -> Result<(), EngineError> {
    let url = format!("{}/api/engine/status", args.url.trim_end_matches('/'));
    info!(url = %url, "Querying engine status");

    let resp = reqwest::Client::new().get(&url).send().await
        .map_err(|e| EngineError::Network(format!("Failed to query engine: {}", e)))?;
    let status = resp.status();
    let body: serde_json::Value = resp.json().await
        .map_err(|e| EngineError::Network(format!("Invalid response: {}", e)))?;

    if !status.is_success() {
        return Err(EngineError::Service {
            status: Some(status.as_u16()),
            message: body["error"].as_str().unwrap_or("unexpected response").to_string(),
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let parsed: EngineStatusBody = serde_json::from_value(body.clone())?;
    let snapshots: Vec<RunnerSnapshot> = parsed.agents.into_values().collect();
    print_status_table(&snapshots);

    let summary: EngineSummary = serde_json::from_value(body["summary"].clone()).unwrap_or_default();
    println!(
        "\n{} running of {} agent(s), {} cycles, {} errors, {} rate limited{}",
        summary.running_count,
        summary.agent_count,
        summary.total_cycles,
        summary.total_errors,
        summary.total_rate_limited,
        if parsed.stopping { style(" (stopping)").yellow().to_string() } else { String::new() },
    );
    Ok(())
}
