use std::path::PathBuf;
use console::style;
use crate::cli::commands::ValidateArgs;
use crate::config;
use crate::errors::EngineError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), EngineError> {
    let loaded = config::parse_config(&PathBuf::from(&args.config)).await?;
    println!("Configuration is valid: {}", args.config);
    for agent in &loaded.engine.agents {
        let marker = if agent.enabled { style("✓").green() } else { style("-").dim() };
        println!(
            "  {} {} ({}) every {:.1}min",
            marker,
            agent.name,
            agent.id,
            agent.interval.as_secs_f64() / 60.0
        );
    }
    if loaded.storage.enabled {
        println!("Activity storage: {}", loaded.storage.database_path);
    } else {
        println!("Activity storage: disabled");
    }
    Ok(())
}
