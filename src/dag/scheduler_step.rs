// src/dag/scheduler_step.rs

//! Step-by-step result type for the scheduler.

use crate::types::TaskName;

/// Structured result of recording one task completion.
///
/// Useful for tests that step a run manually and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Dependents newly marked `Skipped` because the completed task failed.
    pub newly_skipped: Vec<TaskName>,
    /// Whether this step left every task of the run in a terminal state.
    pub run_just_finished: bool,
}
