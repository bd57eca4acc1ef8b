// src/exec/executor.rs

//! Runs a named task after its transitive dependencies.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::dag::{Scheduler, TaskRegistry};
use crate::errors::Result;
use crate::exec::backend::TaskBackend;
use crate::exec::result::{RunReport, RunResult, RunStatus};

/// Drives a [`Scheduler`] to completion, one task body at a time.
#[derive(Debug)]
pub struct Executor<B: TaskBackend> {
    registry: Arc<TaskRegistry>,
    backend: B,
    run_counter: AtomicU64,
}

impl<B: TaskBackend> Executor<B> {
    pub fn new(registry: Arc<TaskRegistry>, backend: B) -> Self {
        Self {
            registry,
            backend,
            run_counter: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `target` and everything it depends on.
    ///
    /// Only an unknown target is an `Err`; task failures are recorded in the
    /// returned report (see [`RunReport::outcome`]).
    pub async fn run(&self, target: &str) -> Result<RunReport> {
        let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let mut scheduler = Scheduler::plan(&self.registry, target, run_id)?;
        let started = Instant::now();

        info!(run_id, target = %target, tasks = ?scheduler.tasks_in_run(), "starting run");

        let mut results = Vec::new();
        while let Some(task) = scheduler.next_ready() {
            let result = self.backend.execute(&task).await;

            match result.status {
                RunStatus::Succeeded => {
                    info!(task = %task.name, run_id, elapsed = ?result.elapsed, "task succeeded");
                }
                _ => {
                    error!(task = %task.name, run_id, cause = %result.cause(), "task failed");
                }
            }

            let step = scheduler.handle_completion(&task.name, result.outcome());
            results.push(result);

            for skipped in step.newly_skipped {
                warn!(task = %skipped, run_id, upstream = %task.name, "task skipped");
                results.push(RunResult::skipped(skipped, &task.name));
            }
        }

        let report = RunReport {
            run_id,
            target: target.to_string(),
            results,
            elapsed: started.elapsed(),
        };

        if report.is_success() {
            info!(run_id, target = %target, elapsed = ?report.elapsed, "run finished");
        } else {
            warn!(run_id, target = %target, elapsed = ?report.elapsed, "run finished with failures");
        }

        Ok(report)
    }
}
