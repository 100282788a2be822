use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::Utc;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::client::ActivationClient;
use crate::config::AgentSpec;
use super::recorder::ActivityRecorder;
use super::state::*;
use tracing::{debug, error, info, warn};

/// Drives one agent's periodic cycle: activate, classify, record, wait.
pub struct AgentRunner {
    spec: AgentSpec,
    client: Arc<dyn ActivationClient>,
    recorder: Arc<dyn ActivityRecorder>,
    timeout: Duration,
    state: RunnerState,
    publisher: watch::Sender<RunnerSnapshot>,
    cancel_token: CancellationToken,
}

/// What the scheduler keeps for a runner once its task is spawned: a way to
/// read its latest snapshot and a way to ask it to stop.
#[derive(Clone)]
pub struct RunnerHandle {
    snapshot: watch::Receiver<RunnerSnapshot>,
    cancel_token: CancellationToken,
}

impl RunnerHandle {
    /// Latest published state. A runner whose task died without publishing
    /// its final state (a panic) is reported as not running.
    pub fn snapshot(&self) -> RunnerSnapshot {
        let mut snap = self.snapshot.borrow().clone();
        if self.snapshot.has_changed().is_err() {
            snap.running = false;
        }
        snap
    }

    /// Ask the runner to stop. Interrupts its interval wait; an activation
    /// already in flight is allowed to finish.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl AgentRunner {
    pub fn new(
        spec: AgentSpec,
        client: Arc<dyn ActivationClient>,
        recorder: Arc<dyn ActivityRecorder>,
        timeout: Duration,
    ) -> Self {
        let state = RunnerState::default();
        let (publisher, _) = watch::channel(RunnerSnapshot::new(&spec, &state));
        Self {
            spec,
            client,
            recorder,
            timeout,
            state,
            publisher,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Replace the runner's cancel token, e.g. with a child of the scheduler's.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn handle(&self) -> RunnerHandle {
        RunnerHandle {
            snapshot: self.publisher.subscribe(),
            cancel_token: self.cancel_token.clone(),
        }
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    /// Spawn the cycle loop onto the runtime. Consumes the runner, so a
    /// runner can only ever be started once.
    pub fn start(self) -> JoinHandle<RunnerState> {
        tokio::spawn(self.run())
    }

    /// Run cycles until stopped. The first activation happens immediately.
    pub async fn run(mut self) -> RunnerState {
        info!(
            agent = %self.spec.name,
            interval_secs = self.spec.interval.as_secs_f64(),
            "Activating autonomous agent"
        );
        self.state.running = true;
        self.state.started_at = Some(Utc::now());
        self.publish();

        while !self.cancel_token.is_cancelled() {
            self.activate_once().await;

            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                _ = tokio::time::sleep(self.spec.interval) => {}
            }
        }

        self.state.running = false;
        self.publish();
        info!(
            agent = %self.spec.name,
            cycles = self.state.cycles_completed,
            errors = self.state.error_count,
            "Agent runner stopped"
        );
        self.state
    }

    /// One activation: call the service, classify the result, update the
    /// counters, hand the outcome to the recorder.
    pub async fn activate_once(&mut self) -> CycleOutcome {
        debug!(agent = %self.spec.name, "Activating autonomous decision cycle");
        let start = Instant::now();

        let result = self.client
            .activate(&self.spec.id, &self.spec.instruction, self.timeout)
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(response) => CycleOutcome::success(response, duration_ms),
            Err(e) => {
                let class = e.classify();
                CycleOutcome::failed(
                    class.cycle_status,
                    e.to_string(),
                    class.error_type,
                    duration_ms,
                )
            }
        };

        self.state.apply(outcome.status, Utc::now());
        self.publish();

        match outcome.status {
            CycleStatus::Success => info!(
                agent = %self.spec.name,
                total = self.state.cycles_completed,
                duration_ms,
                "Decision cycle completed"
            ),
            // The next scheduled cycle is the retry
            CycleStatus::RateLimited => warn!(
                agent = %self.spec.name,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Rate limit or quota exceeded, skipping this cycle"
            ),
            CycleStatus::Error => error!(
                agent = %self.spec.name,
                error_type = outcome.error_type.as_deref().unwrap_or_default(),
                error = outcome.error.as_deref().unwrap_or_default(),
                errors = self.state.error_count,
                "Decision cycle failed"
            ),
        }

        self.record(&outcome).await;
        outcome
    }

    /// Storage failures are logged and dropped; they never touch runner state.
    async fn record(&self, outcome: &CycleOutcome) {
        let mut metadata = json!({
            "activation_instruction": self.spec.instruction,
            "duration_ms": outcome.duration_ms,
        });
        if let Some(error_type) = &outcome.error_type {
            metadata["error_type"] = json!(error_type);
        }

        let record = ActivityRecord {
            agent_id: self.spec.id.clone(),
            agent_name: self.spec.name.clone(),
            cycle_number: self.state.cycles_completed,
            outcome: outcome.clone(),
            metadata,
        };

        match self.recorder.record(&record).await {
            Ok(id) => debug!(agent = %self.spec.name, activity_id = id, cycle = record.cycle_number, "Stored activity"),
            Err(e) => warn!(agent = %self.spec.name, error = %e, "Failed to store activity"),
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(RunnerSnapshot::new(&self.spec, &self.state));
    }
}
