// src/exec/result.rs

//! Per-task results and the report of a whole run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{PipelineError, Result};
use crate::types::{TaskName, TaskOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
    Skipped,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Succeeded => "ok",
            RunStatus::Failed => "FAILED",
            RunStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Result of running (or skipping) one task body.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub task: TaskName,
    pub status: RunStatus,
    /// Files written by built-in bodies, or the destination of a command.
    pub outputs: Vec<PathBuf>,
    /// Failure cause first, then any captured stderr lines.
    pub diagnostics: Vec<String>,
    /// Set when a command was killed after exceeding this timeout.
    pub timed_out: Option<Duration>,
    pub elapsed: Duration,
}

impl RunResult {
    pub fn succeeded(task: impl Into<TaskName>, outputs: Vec<PathBuf>, elapsed: Duration) -> Self {
        Self {
            task: task.into(),
            status: RunStatus::Succeeded,
            outputs,
            diagnostics: Vec::new(),
            timed_out: None,
            elapsed,
        }
    }

    pub fn failed(task: impl Into<TaskName>, diagnostics: Vec<String>, elapsed: Duration) -> Self {
        Self {
            task: task.into(),
            status: RunStatus::Failed,
            outputs: Vec::new(),
            diagnostics,
            timed_out: None,
            elapsed,
        }
    }

    pub fn timed_out(task: impl Into<TaskName>, timeout: Duration, diagnostics: Vec<String>) -> Self {
        Self {
            timed_out: Some(timeout),
            ..Self::failed(task, diagnostics, timeout)
        }
    }

    /// A task that never ran because `upstream` failed.
    pub fn skipped(task: impl Into<TaskName>, upstream: &str) -> Self {
        Self {
            task: task.into(),
            status: RunStatus::Skipped,
            outputs: Vec::new(),
            diagnostics: vec![format!("dependency '{upstream}' failed")],
            timed_out: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn outcome(&self) -> TaskOutcome {
        match self.status {
            RunStatus::Succeeded => TaskOutcome::Success,
            RunStatus::Failed | RunStatus::Skipped => TaskOutcome::Failed,
        }
    }

    /// One-line cause of a failure.
    pub fn cause(&self) -> String {
        self.diagnostics
            .first()
            .cloned()
            .unwrap_or_else(|| "unknown failure".to_string())
    }

    /// The error this result stands for, if it is a failure.
    pub fn error(&self) -> Option<PipelineError> {
        if self.status != RunStatus::Failed {
            return None;
        }
        Some(match self.timed_out {
            Some(timeout) => PipelineError::TaskTimeout {
                task: self.task.clone(),
                timeout,
            },
            None => PipelineError::TaskFailed {
                task: self.task.clone(),
                cause: self.cause(),
            },
        })
    }
}

/// Everything that happened during one `Executor::run`.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: u64,
    pub target: TaskName,
    /// Results in execution order; skipped tasks follow the failure that
    /// caused them.
    pub results: Vec<RunResult>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.status == RunStatus::Succeeded)
    }

    pub fn first_failure(&self) -> Option<&RunResult> {
        self.results.iter().find(|r| r.status == RunStatus::Failed)
    }

    /// `Ok(())` if every task succeeded, else the error of the first failure.
    pub fn outcome(&self) -> Result<()> {
        match self.first_failure().and_then(RunResult::error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Names of the tasks whose bodies actually ran.
    pub fn executed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.status != RunStatus::Skipped)
            .map(|r| r.task.as_str())
            .collect()
    }

    pub fn status_of(&self, task: &str) -> Option<RunStatus> {
        self.results
            .iter()
            .find(|r| r.task == task)
            .map(|r| r.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(results: Vec<RunResult>) -> RunReport {
        RunReport {
            run_id: 1,
            target: "b".into(),
            results,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn outcome_names_first_failure() {
        let r = report(vec![
            RunResult::failed("a", vec!["exit code 2".into()], Duration::ZERO),
            RunResult::skipped("b", "a"),
        ]);

        assert!(!r.is_success());
        assert_eq!(r.executed(), vec!["a"]);
        assert_eq!(r.status_of("b"), Some(RunStatus::Skipped));
        match r.outcome() {
            Err(PipelineError::TaskFailed { task, cause }) => {
                assert_eq!(task, "a");
                assert_eq!(cause, "exit code 2");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn timeout_maps_to_timeout_error() {
        let r = report(vec![RunResult::timed_out(
            "slow",
            Duration::from_secs(1),
            vec!["killed".into()],
        )]);
        assert!(matches!(
            r.outcome(),
            Err(PipelineError::TaskTimeout { ref task, timeout })
                if task == "slow" && timeout == Duration::from_secs(1)
        ));
    }

    #[test]
    fn all_succeeded_is_ok() {
        let r = report(vec![RunResult::succeeded("a", vec![], Duration::ZERO)]);
        assert!(r.is_success());
        assert!(r.outcome().is_ok());
    }
}
