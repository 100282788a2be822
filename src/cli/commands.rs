use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "cadence", version, about = "Autonomous decision-cycle engine for Letta agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured agents until interrupted
    Run(RunArgs),
    /// Serve the activity API without running any agents
    Serve(ServeArgs),
    /// Show live runner status from a running engine
    Status(StatusArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Write a configuration file from LETTA_* and AGENT_<n>_* variables
    GenerateConfig(GenerateConfigArgs),
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Only run these agent IDs (repeatable or comma-separated)
    #[arg(short, long = "agent", value_delimiter = ',')]
    pub agents: Vec<String>,

    /// Also serve the activity API
    #[arg(long)]
    pub api: bool,

    /// API listen address
    #[arg(long, default_value = "0.0.0.0")]
    pub api_host: String,

    /// API listen port
    #[arg(long, default_value = "8000")]
    pub api_port: u16,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port
    #[arg(long, default_value = "8000")]
    pub port: u16,

    /// Listen address
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// SQLite database path
    #[arg(long, default_value = "./data/activities.db")]
    pub db: String,
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    /// Base URL of an engine started with `run --api`
    #[arg(long, default_value = "http://localhost:8000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Args, Clone)]
pub struct GenerateConfigArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,
}
