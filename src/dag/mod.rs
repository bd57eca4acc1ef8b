// src/dag/mod.rs

//! Task registry, DAG representation and per-run scheduling.
//!
//! - [`graph`] holds the directed acyclic graph of tasks.
//! - [`registry`] owns every registered [`TaskDefinition`].
//! - [`scheduler`] contains the per-run state machine that decides which
//!   task runs next and which dependents are skipped after a failure.
//! - [`task_info`] provides task bodies, definitions and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod registry;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use registry::TaskRegistry;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskBody, TaskDefinition, TaskRunState};
