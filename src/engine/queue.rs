// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::types::TaskName;

/// Queue of triggers that arrive while a run is already executing.
///
/// Semantics:
/// - Triggers are kept in arrival order.
/// - A task is queued at most once; repeated triggers for a task that is
///   already waiting are merged into the existing entry.
/// - Once the active run finishes, the runtime pops the oldest entry and
///   starts a new run for it.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: VecDeque<TaskName>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Record a trigger. Returns false if the task was already queued.
    pub fn record_trigger(&mut self, task: &str) -> bool {
        if self.pending.iter().any(|t| t == task) {
            debug!(task = %task, "trigger merged into queued entry");
            return false;
        }
        self.pending.push_back(task.to_string());
        debug!(task = %task, queued = self.pending.len(), "trigger queued behind active run");
        true
    }

    /// Take the oldest queued trigger.
    pub fn pop_next(&mut self) -> Option<TaskName> {
        self.pending.pop_front()
    }
}
