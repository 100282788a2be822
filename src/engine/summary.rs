use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use super::state::RunnerSnapshot;

/// Totals across every runner the scheduler knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub agent_count: usize,
    pub running_count: usize,
    pub total_cycles: u64,
    pub total_errors: u64,
    pub total_rate_limited: u64,
}

pub fn compute_summary(snapshots: &HashMap<String, RunnerSnapshot>) -> EngineSummary {
    EngineSummary {
        agent_count: snapshots.len(),
        running_count: snapshots.values().filter(|s| s.running).count(),
        total_cycles: snapshots.values().map(|s| s.cycles_completed).sum(),
        total_errors: snapshots.values().map(|s| s.error_count).sum(),
        total_rate_limited: snapshots.values().map(|s| s.rate_limited_count).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::config::AgentSpec;
    use crate::engine::state::RunnerState;

    #[test]
    fn test_compute_summary() {
        let mut snapshots = HashMap::new();
        let a = AgentSpec::new("a", "A", Duration::from_secs(60), "go");
        let b = AgentSpec::new("b", "B", Duration::from_secs(60), "go");
        snapshots.insert("a".to_string(), RunnerSnapshot::new(&a, &RunnerState {
            cycles_completed: 4,
            error_count: 1,
            running: true,
            ..Default::default()
        }));
        snapshots.insert("b".to_string(), RunnerSnapshot::new(&b, &RunnerState {
            cycles_completed: 2,
            rate_limited_count: 3,
            ..Default::default()
        }));

        let summary = compute_summary(&snapshots);
        assert_eq!(summary.agent_count, 2);
        assert_eq!(summary.running_count, 1);
        assert_eq!(summary.total_cycles, 6);
        assert_eq!(summary.total_errors, 1);
        assert_eq!(summary.total_rate_limited, 3);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(compute_summary(&HashMap::new()), EngineSummary::default());
    }
}
