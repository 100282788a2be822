pub mod provider;
pub mod letta;
pub mod types;

use std::sync::Arc;
use crate::config::EngineSpec;

pub use provider::ActivationClient;
pub use letta::LettaClient;
pub use types::{ActivationResult, ToolInvocation, Usage};

pub fn create_client(spec: &EngineSpec) -> Arc<dyn ActivationClient> {
    Arc::new(LettaClient::new(&spec.api_key, Some(&spec.base_url)))
}
