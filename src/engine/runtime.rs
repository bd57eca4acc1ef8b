// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::core::SessionCore;
use crate::engine::{CoreCommand, CoreStep, ReloadNotifier, RuntimeEvent};
use crate::exec::{Executor, TaskBackend};

/// Counters reported when a watch session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub runs: usize,
    pub failed_runs: usize,
    pub reloads: usize,
}

enum RunEnd {
    Finished { success: bool },
    Shutdown,
}

/// Drives the [`SessionCore`] in response to `RuntimeEvent`s and delegates
/// task execution to an [`Executor`].
///
/// This is the IO shell around `SessionCore`: it reads events, awaits runs
/// (still listening for triggers and shutdown while a run is active) and
/// sends live reloads.
pub struct Runtime<B: TaskBackend> {
    core: SessionCore,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: Executor<B>,
    reload: Option<Arc<dyn ReloadNotifier>>,
}

impl<B: TaskBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("reload", &self.reload.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: TaskBackend> Runtime<B> {
    pub fn new(event_rx: mpsc::Receiver<RuntimeEvent>, executor: Executor<B>) -> Self {
        Self {
            core: SessionCore::new(),
            event_rx,
            executor,
            reload: None,
        }
    }

    pub fn with_reload(mut self, reload: Arc<dyn ReloadNotifier>) -> Self {
        self.reload = Some(reload);
        self
    }

    /// Main event loop. Returns when shutdown is requested or every event
    /// sender is gone.
    pub async fn run(mut self) -> SessionSummary {
        info!("watch session started");
        let mut summary = SessionSummary::default();

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            if !self.execute(step, &mut summary).await {
                break;
            }
        }

        info!(
            runs = summary.runs,
            failed = summary.failed_runs,
            reloads = summary.reloads,
            "watch session ended"
        );
        summary
    }

    /// Execute the commands of a core step. Returns false to stop the loop.
    async fn execute(&mut self, step: CoreStep, summary: &mut SessionSummary) -> bool {
        if !step.keep_running {
            info!("shutdown requested");
            return false;
        }

        let mut commands: VecDeque<CoreCommand> = step.commands.into();
        while let Some(command) = commands.pop_front() {
            match command {
                CoreCommand::RunTask(task) => match self.run_task(&task).await {
                    RunEnd::Finished { success } => {
                        summary.runs += 1;
                        if !success {
                            summary.failed_runs += 1;
                        }
                        commands.extend(self.core.run_finished(&task, success).commands);
                    }
                    RunEnd::Shutdown => return false,
                },
                CoreCommand::NotifyReload => {
                    if let Some(reload) = &self.reload {
                        reload.notify_reload();
                        summary.reloads += 1;
                    }
                }
                CoreCommand::RequestExit => return false,
            }
        }
        true
    }

    /// Run `task`, feeding events that arrive meanwhile into the core.
    ///
    /// A shutdown request abandons the run; dropping it kills any child
    /// process.
    async fn run_task(&mut self, task: &str) -> RunEnd {
        let Self {
            core,
            event_rx,
            executor,
            ..
        } = self;

        let run = executor.run(task);
        tokio::pin!(run);
        let mut channel_open = true;

        loop {
            tokio::select! {
                report = &mut run => {
                    let success = match report {
                        Ok(report) => match report.outcome() {
                            Ok(()) => true,
                            Err(e) => {
                                error!(task = %task, error = %e, "run failed; waiting for changes");
                                false
                            }
                        },
                        Err(e) => {
                            error!(task = %task, error = %e, "could not start run");
                            false
                        }
                    };
                    return RunEnd::Finished { success };
                }
                event = event_rx.recv(), if channel_open => {
                    match event {
                        Some(event) => {
                            debug!(?event, "event during active run");
                            if !core.step(event).keep_running {
                                info!(task = %task, "shutdown requested; abandoning active run");
                                return RunEnd::Shutdown;
                            }
                        }
                        None => channel_open = false,
                    }
                }
            }
        }
    }
}
