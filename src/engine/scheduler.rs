use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use dashmap::DashMap;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use crate::client::ActivationClient;
use crate::config::{AgentSpec, EngineSpec};
use crate::errors::EngineError;
use super::recorder::ActivityRecorder;
use super::runner::{AgentRunner, RunnerHandle};
use super::state::RunnerSnapshot;
use super::summary::{compute_summary, EngineSummary};
use tracing::{debug, error, info, warn};

/// Owns one runner per selected agent and coordinates their shutdown.
pub struct Scheduler {
    spec: EngineSpec,
    client: Arc<dyn ActivationClient>,
    recorder: Arc<dyn ActivityRecorder>,
    runners: DashMap<String, RunnerHandle>,
    cancel_token: CancellationToken,
    started: AtomicBool,
    stopping: AtomicBool,
}

impl Scheduler {
    pub fn new(
        spec: EngineSpec,
        client: Arc<dyn ActivationClient>,
        recorder: Arc<dyn ActivityRecorder>,
    ) -> Self {
        Self {
            spec,
            client,
            recorder,
            runners: DashMap::new(),
            cancel_token: CancellationToken::new(),
            started: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
        }
    }

    pub fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    /// Enabled agents, narrowed to `subset` when one is given.
    pub fn select_agents(&self, subset: Option<&[String]>) -> Vec<&AgentSpec> {
        if let Some(ids) = subset {
            for id in ids {
                if self.spec.agent(id).is_none() {
                    warn!(agent_id = %id, "Requested agent is not configured");
                }
            }
        }

        self.spec.agents
            .iter()
            .filter(|a| a.enabled)
            .filter(|a| subset.map_or(true, |ids| ids.iter().any(|id| id == &a.id)))
            .collect()
    }

    /// Start a runner for every selected agent and block until they have all
    /// ended or the engine is stopped. Firing `shutdown` is equivalent to
    /// calling [`Scheduler::stop`] once.
    pub async fn start(
        &self,
        subset: Option<&[String]>,
        shutdown: CancellationToken,
    ) -> Result<(), EngineError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(EngineError::Internal("Engine already started".into()));
        }

        let selected = self.select_agents(subset);
        if selected.is_empty() {
            warn!("No enabled agents selected, nothing to run");
            return Ok(());
        }

        info!(count = selected.len(), "Starting autonomous agents");
        let mut tasks = JoinSet::new();
        for agent in selected {
            let runner = AgentRunner::new(
                agent.clone(),
                self.client.clone(),
                self.recorder.clone(),
                self.spec.timeout,
            )
            .with_cancel_token(self.cancel_token.child_token());

            self.runners.insert(agent.id.clone(), runner.handle());
            let agent_id = agent.id.clone();
            tasks.spawn(async move {
                runner.run().await;
                agent_id
            });
            info!(
                agent = %agent.name,
                agent_id = %agent.id,
                interval_secs = agent.interval.as_secs_f64(),
                "Started agent runner"
            );
        }
        info!(service = self.client.service_name(), "Autonomous engine active");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    self.stop();
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(agent_id)) => debug!(agent_id = %agent_id, "Agent runner ended"),
                    Some(Err(e)) => error!(error = %e, "Agent runner terminated abnormally"),
                    None => {
                        info!("All agent runners have ended");
                        return Ok(());
                    }
                },
            }
        }

        self.drain(&mut tasks).await;
        info!(summary = ?self.summary(), "Engine stopped");
        Ok(())
    }

    /// Wait up to the grace period for in-flight activations; whatever is
    /// still running afterwards is aborted when the set is dropped.
    async fn drain(&self, tasks: &mut JoinSet<String>) {
        let grace = self.spec.shutdown_grace;
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!(error = %e, "Agent runner terminated abnormally");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = tasks.len(),
                grace_secs = grace.as_secs_f64(),
                "Grace period elapsed with activations still in flight, abandoning them"
            );
        }
    }

    /// Signal every runner to stop. Safe to call any number of times.
    pub fn stop(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(runners = self.runners.len(), "Stopping all agents");
        self.cancel_token.cancel();
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> HashMap<String, RunnerSnapshot> {
        self.runners
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    pub fn summary(&self) -> EngineSummary {
        compute_summary(&self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::engine::testing::{MemoryRecorder, ScriptedClient};

    fn agent(id: &str) -> AgentSpec {
        AgentSpec::new(id, "", Duration::from_secs(60), "go")
    }

    fn scheduler(agents: Vec<AgentSpec>) -> Scheduler {
        Scheduler::new(
            EngineSpec::new("key", agents),
            Arc::new(ScriptedClient::always_ok()),
            Arc::new(MemoryRecorder::default()),
        )
    }

    #[test]
    fn test_select_skips_disabled() {
        let s = scheduler(vec![agent("a"), agent("b").disabled(), agent("c")]);
        let ids: Vec<&str> = s.select_agents(None).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_select_with_subset() {
        let s = scheduler(vec![agent("a"), agent("b").disabled(), agent("c")]);
        let subset = vec!["b".to_string(), "c".to_string(), "zzz".to_string()];
        let ids: Vec<&str> = s.select_agents(Some(&subset)).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[tokio::test]
    async fn test_empty_selection_returns_ok() {
        let s = scheduler(vec![agent("a").disabled()]);
        s.start(None, CancellationToken::new()).await.unwrap();
        assert!(s.status().is_empty());
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let s = scheduler(vec![]);
        s.start(None, CancellationToken::new()).await.unwrap();
        let err = s.start(None, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let s = scheduler(vec![agent("a")]);
        s.stop();
        s.stop();
        assert!(s.is_stopping());
        s.start(None, CancellationToken::new()).await.unwrap();
        let status = s.status();
        assert_eq!(status.len(), 1);
        assert!(!status["a"].running);
    }
}
