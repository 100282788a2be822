use crate::cli::commands::GenerateConfigArgs;
use crate::config::env::{config_from_env, render_yaml};
use crate::errors::EngineError;
use tracing::{info, warn};

pub async fn handle_generate_config(args: GenerateConfigArgs) -> Result<(), EngineError> {
    let lookup = |name: &str| std::env::var(name).ok();
    let config = config_from_env(&lookup)?;

    if config.letta.as_ref().and_then(|l| l.api_key.as_deref()).map_or(true, str::is_empty) {
        warn!("LETTA_API_KEY is not set; the generated config will not load until it is");
    }
    if config.agents.is_empty() {
        warn!("No AGENT_1_ID or AGENT_1_NAME found; the generated config has no agents");
    }

    let yaml = render_yaml(&config)?;
    match args.output {
        Some(path) => {
            if let Some(parent) = std::path::Path::new(&path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            tokio::fs::write(&path, yaml).await?;
            info!(path = %path, agents = config.agents.len(), "Wrote configuration");
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
