// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::registry::TaskRegistry;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{deps_satisfied, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskRunState};
use crate::errors::Result;
use crate::types::{TaskName, TaskOutcome};

/// Per-run scheduler over a shared, read-only [`TaskRegistry`].
///
/// It is responsible for:
/// - collecting the target and its transitive dependencies into the run
/// - handing out one ready task at a time, lowest registration index first
/// - recording task outcomes
/// - skipping dependents when a task fails
#[derive(Debug)]
pub struct Scheduler<'r> {
    registry: &'r TaskRegistry,
    target: TaskName,
    run_id: u64,
    states: HashMap<TaskName, RunState>,
}

impl<'r> Scheduler<'r> {
    /// Plan a run of `target`. Fails with `TaskNotFound` for unknown targets.
    pub fn plan(registry: &'r TaskRegistry, target: &str, run_id: u64) -> Result<Self> {
        registry.resolve(target)?;

        let mut states = HashMap::new();
        StateManager::new(registry, &mut states).mark_closure_pending(target);

        debug!(
            run_id,
            target = %target,
            tasks = states.len(),
            "scheduler: planned run"
        );

        Ok(Self {
            registry,
            target: target.to_string(),
            run_id,
            states,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Read-only view of the given task's run state; `None` for unknown tasks.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        if !self.registry.contains(task) {
            return None;
        }
        Some(self.states.get(task).copied().into())
    }

    /// Names of the tasks participating in this run, in registration order.
    pub fn tasks_in_run(&self) -> Vec<TaskName> {
        self.registry
            .task_names()
            .filter(|name| self.states.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    /// Whether every dependency of `task` has succeeded in this run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let def = self.registry.resolve(task).ok()?;
        Some(deps_satisfied(&self.states, def))
    }

    /// Whether every task of the run reached a terminal state.
    pub fn is_finished(&self) -> bool {
        !self
            .states
            .values()
            .any(|state| matches!(state, RunState::Pending | RunState::Running))
    }

    /// Hand out the next ready task, marking it `Running`.
    ///
    /// Returns `None` when nothing is ready: either the run is finished or
    /// every remaining task waits on one that is still running.
    pub fn next_ready(&mut self) -> Option<ScheduledTask> {
        let def = StateManager::new(self.registry, &mut self.states).take_next_ready()?;

        info!(task = %def.name, run_id = self.run_id, "scheduling task");
        Some(ScheduledTask::from_definition(def, self.run_id))
    }

    /// Record the outcome of a running task.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut manager = StateManager::new(self.registry, &mut self.states);

        let newly_skipped = match outcome {
            TaskOutcome::Success => {
                manager.mark_done(task, true);
                debug!(task = %task, run_id = self.run_id, "task completed successfully");
                Vec::new()
            }
            TaskOutcome::Failed => {
                manager.mark_done(task, false);
                let skipped = manager.mark_dependents_skipped(task);
                warn!(
                    task = %task,
                    run_id = self.run_id,
                    ?skipped,
                    "task failed; skipping dependents in this run"
                );
                skipped
            }
        };

        let run_just_finished = manager.all_tasks_terminal();
        if run_just_finished {
            info!(run_id = self.run_id, target = %self.target, "scheduler: all tasks terminal");
        }

        SchedulerStep {
            newly_skipped,
            run_just_finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::TaskBody;

    /// vendor <- js, sass; (sass, js) <- build
    fn registry() -> TaskRegistry {
        let mut reg = TaskRegistry::new();
        reg.register("sass", vec![], TaskBody::Group).unwrap();
        reg.register("vendor", vec![], TaskBody::Group).unwrap();
        reg.register("js", vec!["vendor".into()], TaskBody::Group).unwrap();
        reg.register("img", vec![], TaskBody::Group).unwrap();
        reg.register("build", vec!["sass".into(), "js".into()], TaskBody::Group)
            .unwrap();
        reg
    }

    fn drain(scheduler: &mut Scheduler<'_>, fail: &[&str]) -> Vec<String> {
        let mut order = Vec::new();
        while let Some(task) = scheduler.next_ready() {
            let outcome = if fail.contains(&task.name.as_str()) {
                TaskOutcome::Failed
            } else {
                TaskOutcome::Success
            };
            scheduler.handle_completion(&task.name, outcome);
            order.push(task.name);
        }
        order
    }

    #[test]
    fn runs_closure_in_registration_order() {
        let reg = registry();
        let mut s = Scheduler::plan(&reg, "build", 1).unwrap();

        assert_eq!(s.tasks_in_run(), vec!["sass", "vendor", "js", "build"]);
        assert_eq!(s.run_state_of("img"), Some(TaskRunState::NotInRun));

        assert_eq!(drain(&mut s, &[]), vec!["sass", "vendor", "js", "build"]);
        assert!(s.is_finished());
    }

    #[test]
    fn failure_skips_dependents_but_not_independent_branches() {
        let reg = registry();
        let mut s = Scheduler::plan(&reg, "build", 1).unwrap();

        assert_eq!(drain(&mut s, &["vendor"]), vec!["sass", "vendor"]);
        assert_eq!(s.run_state_of("sass"), Some(TaskRunState::DoneSuccess));
        assert_eq!(s.run_state_of("vendor"), Some(TaskRunState::DoneFailed));
        assert_eq!(s.run_state_of("js"), Some(TaskRunState::Skipped));
        assert_eq!(s.run_state_of("build"), Some(TaskRunState::Skipped));
        assert!(s.is_finished());
    }

    #[test]
    fn completion_step_reports_skips_and_finish() {
        let reg = registry();
        let mut s = Scheduler::plan(&reg, "js", 7).unwrap();

        let first = s.next_ready().unwrap();
        assert_eq!(first.name, "vendor");
        assert_eq!(first.run_id, 7);
        assert_eq!(s.run_state_of("js"), Some(TaskRunState::Pending));
        assert_eq!(s.deps_satisfied("js"), Some(false));

        let step = s.handle_completion("vendor", TaskOutcome::Failed);
        assert_eq!(step.newly_skipped, vec!["js".to_string()]);
        assert!(step.run_just_finished);
        assert!(s.next_ready().is_none());
    }

    #[test]
    fn unknown_target_is_rejected() {
        let reg = registry();
        assert!(Scheduler::plan(&reg, "deploy", 1).is_err());
    }
}
