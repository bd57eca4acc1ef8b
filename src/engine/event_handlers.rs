// src/engine/event_handlers.rs

//! Event handlers for the core runtime.

use tracing::{debug, info};

use crate::engine::TriggerReason;
use crate::engine::queue::TriggerQueue;
use crate::types::TaskName;

/// Commands the IO shell should execute after a core step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Run this task and its dependencies.
    RunTask(TaskName),
    /// Tell connected browsers to reload.
    NotifyReload,
    /// Stop the session.
    RequestExit,
}

/// Result of feeding one event into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands for the shell, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the runtime should continue its loop.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub fn exit() -> Self {
        Self {
            commands: vec![CoreCommand::RequestExit],
            keep_running: false,
        }
    }
}

/// Handle a trigger: start a run when idle, else queue it.
pub fn handle_task_trigger(
    active: &mut Option<TaskName>,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    if let Some(running) = active.as_deref() {
        debug!(task = %task, running = %running, ?reason, "run in progress; queueing trigger");
        queue.record_trigger(&task);
        return CoreStep::continue_with(Vec::new());
    }

    info!(task = %task, ?reason, "starting run");
    *active = Some(task.clone());
    CoreStep::continue_with(vec![CoreCommand::RunTask(task)])
}

/// Handle the end of the active run: reload on success, then start the next
/// queued trigger, if any.
pub fn handle_run_finished(
    active: &mut Option<TaskName>,
    queue: &mut TriggerQueue,
    task: &str,
    success: bool,
) -> CoreStep {
    if active.as_deref() != Some(task) {
        debug!(task = %task, ?active, "completion for a run that is not active; ignoring");
        return CoreStep::continue_with(Vec::new());
    }
    *active = None;

    let mut commands = Vec::new();
    if success {
        commands.push(CoreCommand::NotifyReload);
    }
    if let Some(next) = queue.pop_next() {
        info!(task = %next, "starting queued run");
        *active = Some(next.clone());
        commands.push(CoreCommand::RunTask(next));
    }
    CoreStep::continue_with(commands)
}
