use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::client::ActivationResult;
use crate::config::AgentSpec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CycleStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "rate_limit")]
    RateLimited,
    #[serde(rename = "error")]
    Error,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limit",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "rate_limit" => Some(Self::RateLimited),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one activation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub status: CycleStatus,
    pub response: Option<ActivationResult>,
    pub error: Option<String>,
    pub error_type: Option<String>,
    pub duration_ms: u64,
}

impl CycleOutcome {
    pub fn success(response: ActivationResult, duration_ms: u64) -> Self {
        Self {
            status: CycleStatus::Success,
            response: Some(response),
            error: None,
            error_type: None,
            duration_ms,
        }
    }

    pub fn failed(status: CycleStatus, error: String, error_type: &str, duration_ms: u64) -> Self {
        Self {
            status,
            response: None,
            error: Some(error),
            error_type: Some(error_type.to_string()),
            duration_ms,
        }
    }
}

/// Everything handed to the recorder for one finished cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub agent_id: String,
    pub agent_name: String,
    pub cycle_number: u64,
    pub outcome: CycleOutcome,
    pub metadata: serde_json::Value,
}

/// Counters owned by a single runner. Only the runner's own task writes them.
#[derive(Debug, Clone, Default)]
pub struct RunnerState {
    pub cycles_completed: u64,
    pub error_count: u64,
    pub rate_limited_count: u64,
    pub last_activation: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub running: bool,
}

impl RunnerState {
    /// Fold one classified outcome into the counters.
    pub fn apply(&mut self, status: CycleStatus, at: DateTime<Utc>) {
        match status {
            CycleStatus::Success => {
                self.cycles_completed += 1;
                self.last_activation = Some(at);
            }
            CycleStatus::RateLimited => self.rate_limited_count += 1,
            CycleStatus::Error => self.error_count += 1,
        }
    }
}

/// Read-only copy of a runner's state, as published to the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerSnapshot {
    pub agent_id: String,
    pub agent_name: String,
    pub interval_secs: f64,
    pub cycles_completed: u64,
    pub error_count: u64,
    pub rate_limited_count: u64,
    pub last_activation: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub running: bool,
}

impl RunnerSnapshot {
    pub fn new(spec: &AgentSpec, state: &RunnerState) -> Self {
        Self {
            agent_id: spec.id.clone(),
            agent_name: spec.name.clone(),
            interval_secs: spec.interval.as_secs_f64(),
            cycles_completed: state.cycles_completed,
            error_count: state.error_count,
            rate_limited_count: state.rate_limited_count,
            last_activation: state.last_activation,
            started_at: state.started_at,
            running: state.running,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs).unwrap_or(Duration::MAX)
    }
}
