use async_trait::async_trait;
use crate::errors::EngineError;
use super::state::ActivityRecord;

/// Durable sink for finished cycles. Invoked concurrently by every runner.
#[async_trait]
pub trait ActivityRecorder: Send + Sync {
    /// Store one record and return its identifier.
    async fn record(&self, record: &ActivityRecord) -> Result<i64, EngineError>;
}

/// Recorder used when storage is disabled.
pub struct NullRecorder;

#[async_trait]
impl ActivityRecorder for NullRecorder {
    async fn record(&self, _record: &ActivityRecord) -> Result<i64, EngineError> {
        Ok(0)
    }
}
