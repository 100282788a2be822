pub mod credentials;
pub mod env;
pub mod parser;
pub mod schema;
pub mod types;

pub use types::*;
pub use parser::{parse_config, parse_config_str, LoadedConfig};
