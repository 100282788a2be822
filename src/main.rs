use cadence::cli::{self, Commands};
use cadence::errors::EngineError;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.no_color {
        console::set_colors_enabled(false);
    }

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .init();
    }

    let result = match cli.command {
        Commands::Run(args) => cli::run::handle_run(args).await,
        Commands::Serve(args) => cli::serve::handle_serve(args).await,
        Commands::Status(args) => cli::status::handle_status(args).await,
        Commands::Validate(args) => cli::validate::handle_validate(args).await,
        Commands::GenerateConfig(args) => cli::generate_config::handle_generate_config(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            EngineError::Config(_) | EngineError::Yaml(_) => 2,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}
