pub mod commands;
pub mod generate_config;
pub mod run;
pub mod serve;
pub mod status;
pub mod table;
pub mod validate;

pub use commands::{Cli, Commands};
