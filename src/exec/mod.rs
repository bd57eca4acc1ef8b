// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`executor`] drives one run of a target and its dependencies.
//! - [`backend`] provides the `TaskBackend` trait and the production
//!   `ProcessBackend`; tests replace it with a fake implementation.
//! - [`task_runner`] runs shell commands as child processes.
//! - [`builtin`] implements the `copy` and `concat` bodies.
//! - [`sources`] resolves `src` globs into files.
//! - [`interpolate`] fills `{placeholders}` in commands.
//! - [`result`] holds per-task results and the run report.

pub mod backend;
pub mod builtin;
pub mod executor;
pub mod interpolate;
pub mod result;
pub mod sources;
pub mod task_runner;

pub use backend::{ExecContext, ProcessBackend, TaskBackend};
pub use executor::Executor;
pub use result::{RunReport, RunResult, RunStatus};
