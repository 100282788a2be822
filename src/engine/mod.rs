pub mod recorder;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;

pub use recorder::{ActivityRecorder, NullRecorder};
pub use runner::{AgentRunner, RunnerHandle};
pub use scheduler::Scheduler;
pub use state::{ActivityRecord, CycleOutcome, CycleStatus, RunnerSnapshot, RunnerState};
pub use summary::EngineSummary;
