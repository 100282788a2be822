//! In-memory client and recorders for engine unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use crate::client::{ActivationClient, ActivationResult};
use crate::errors::EngineError;
use super::recorder::ActivityRecorder;
use super::state::ActivityRecord;

type ErrorFactory = Arc<dyn Fn() -> EngineError + Send + Sync>;

pub struct ScriptedClient {
    error: Option<ErrorFactory>,
    delay: Duration,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub fn always_ok() -> Self {
        Self { error: None, delay: Duration::ZERO, calls: Mutex::new(Vec::new()) }
    }

    pub fn always_err(make: impl Fn() -> EngineError + Send + Sync + 'static) -> Self {
        Self { error: Some(Arc::new(make)), delay: Duration::ZERO, calls: Mutex::new(Vec::new()) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivationClient for ScriptedClient {
    async fn activate(&self, agent_id: &str, instruction: &str, _timeout: Duration) -> Result<ActivationResult, EngineError> {
        self.calls.lock().unwrap().push((agent_id.to_string(), instruction.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.error {
            Some(make) => Err(make()),
            None => Ok(ActivationResult { text: Some("done".into()), ..Default::default() }),
        }
    }

    fn service_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<ActivityRecord>>,
}

impl MemoryRecorder {
    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityRecorder for MemoryRecorder {
    async fn record(&self, record: &ActivityRecord) -> Result<i64, EngineError> {
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        Ok(records.len() as i64)
    }
}

pub struct FailingRecorder;

#[async_trait]
impl ActivityRecorder for FailingRecorder {
    async fn record(&self, _record: &ActivityRecord) -> Result<i64, EngineError> {
        Err(EngineError::Database("disk I/O error".into()))
    }
}
