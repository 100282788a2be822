use std::time::Duration;
use async_trait::async_trait;
use crate::errors::EngineError;
use super::types::ActivationResult;

/// Sends an instruction to a hosted agent and waits for its reply.
///
/// Shared by every runner at once, so implementations must be safe for
/// concurrent use.
#[async_trait]
pub trait ActivationClient: Send + Sync {
    async fn activate(
        &self,
        agent_id: &str,
        instruction: &str,
        timeout: Duration,
    ) -> Result<ActivationResult, EngineError>;

    /// Service name for logging
    fn service_name(&self) -> &str;
}
