// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::registry::TaskRegistry;
use crate::dag::task_info::{RunState, TaskDefinition};
use crate::types::TaskName;

/// Manages per-run state transitions for the tasks of one run.
///
/// Only tasks in the run's closure have an entry in `states`.
pub struct StateManager<'a> {
    registry: &'a TaskRegistry,
    states: &'a mut HashMap<TaskName, RunState>,
}

impl<'a> StateManager<'a> {
    pub fn new(registry: &'a TaskRegistry, states: &'a mut HashMap<TaskName, RunState>) -> Self {
        Self { registry, states }
    }

    /// Include `target` and all its transitive dependencies in this run,
    /// marking each `Pending`.
    pub fn mark_closure_pending(&mut self, target: &str) {
        for name in self.registry.graph().closure_of(target) {
            debug!(task = %name, "marked Pending for this run");
            self.states.insert(name, RunState::Pending);
        }
    }

    /// Pick the next task to run: the `Pending` task whose dependencies have
    /// all succeeded, with the lowest registration index. Marks it `Running`.
    pub fn take_next_ready(&mut self) -> Option<&'a TaskDefinition> {
        let registry = self.registry;
        let states: &HashMap<TaskName, RunState> = &*self.states;
        let next = registry
            .definitions()
            .filter(|def| matches!(states.get(&def.name), Some(RunState::Pending)))
            .find(|def| deps_satisfied(states, def))?;

        debug!(task = %next.name, index = next.index, "dependencies satisfied; marking Running");
        self.states.insert(next.name.clone(), RunState::Running);
        Some(next)
    }

    /// Record the terminal state of a task that was running.
    pub fn mark_done(&mut self, task: &str, success: bool) {
        match self.states.get_mut(task) {
            Some(state) if *state == RunState::Running => {
                *state = if success {
                    RunState::DoneSuccess
                } else {
                    RunState::DoneFailed
                };
            }
            Some(other) => {
                warn!(task = %task, state = ?other, "completion for a task that is not running; ignoring");
            }
            None => {
                warn!(task = %task, "completion for task outside this run; ignoring");
            }
        }
    }

    /// Mark every pending transitive dependent of a failed task as `Skipped`.
    ///
    /// Returns the newly skipped tasks in registration order.
    pub fn mark_dependents_skipped(&mut self, failed_task: &str) -> Vec<TaskName> {
        let registry = self.registry;
        let graph = registry.graph();
        let mut stack: Vec<&str> = graph
            .dependents_of(failed_task)
            .iter()
            .map(String::as_str)
            .collect();

        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(state) = self.states.get_mut(name) {
                if *state == RunState::Pending {
                    *state = RunState::Skipped;
                    debug!(task = %name, upstream = %failed_task, "skipping dependent of failed task");
                    newly_skipped.push(name.to_string());
                    stack.extend(graph.dependents_of(name).iter().map(String::as_str));
                }
            }
        }

        newly_skipped.sort_by_key(|name| {
            registry
                .resolve(name)
                .map(|def| def.index)
                .unwrap_or(usize::MAX)
        });
        newly_skipped
    }

    /// Check if every task in the run is in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self
            .states
            .values()
            .any(|state| matches!(state, RunState::Pending | RunState::Running))
    }
}

/// Whether every dependency of `def` succeeded in this run.
///
/// All dependencies of a task in the run are themselves in the run, so a
/// missing entry means the run state is corrupt and counts as unsatisfied.
pub fn deps_satisfied(states: &HashMap<TaskName, RunState>, def: &TaskDefinition) -> bool {
    def.deps.iter().all(|dep| match states.get(dep) {
        Some(RunState::DoneSuccess) => true,
        Some(_) => false,
        None => {
            warn!(task = %def.name, dep = %dep, "dependency missing from run state");
            false
        }
    })
}
