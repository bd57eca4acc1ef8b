// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

use crate::types::TaskName;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Task '{0}' is already registered")]
    DuplicateTask(TaskName),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: TaskName, dependency: TaskName },

    #[error("Task not found: {0}")]
    TaskNotFound(TaskName),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("Task '{task}' failed: {cause}")]
    TaskFailed { task: TaskName, cause: String },

    #[error("Task '{task}' timed out after {timeout:?}")]
    TaskTimeout { task: TaskName, timeout: Duration },

    #[error("Port {port} is already in use")]
    PortInUse { port: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
