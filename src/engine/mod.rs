// src/engine/mod.rs

//! Watch-session orchestration.
//!
//! This module ties together:
//! - the executor (one run of a target and its dependencies at a time)
//! - the trigger queue (what happens when triggers arrive while a run is active)
//! - the runtime event loop that reacts to:
//!   - file-watch triggers
//!   - shutdown signals
//! - live reload after successful runs
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::types::TaskName;

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The initial build when a watch session starts.
    Initial,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Events flowing into the runtime from the watcher and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A task should run (together with its dependencies).
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Something that can tell connected browsers to reload.
pub trait ReloadNotifier: Send + Sync {
    /// Returns the number of clients notified.
    fn notify_reload(&self) -> usize;
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::SessionCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::{Runtime, SessionSummary};
