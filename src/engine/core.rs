// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and run completions and produces
//! [`CoreCommand`](super::CoreCommand)s describing what the IO shell should
//! do next. The async shell (`engine::runtime::Runtime`) is responsible for
//! reading events from channels, running the executor, and sending reloads.
//!
//! The core has no channels, no Tokio types and performs no IO, so it is
//! unit tested directly.

use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{CoreStep, handle_run_finished, handle_task_trigger};
use crate::engine::queue::TriggerQueue;
use crate::types::TaskName;

/// Pure watch-session state: the active run and the triggers waiting for it.
#[derive(Debug, Default)]
pub struct SessionCore {
    active: Option<TaskName>,
    queue: TriggerQueue,
}

impl SessionCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Task of the run currently in progress.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.active, &mut self.queue, task, reason)
            }
            RuntimeEvent::ShutdownRequested => CoreStep::exit(),
        }
    }

    /// Record that the run of `task` finished.
    pub fn run_finished(&mut self, task: &str, success: bool) -> CoreStep {
        handle_run_finished(&mut self.active, &mut self.queue, task, success)
    }
}
