// src/dag/task_info.rs

//! Task definitions, bodies and per-run state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::model::TaskConfig;
use crate::types::{parse_duration, TaskName};

/// What a task does when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskBody {
    /// No action; the task only aggregates its dependencies.
    Group,
    /// Run a shell command (an external transformer or site generator).
    Command {
        cmd: String,
        src: Vec<String>,
        dest: Option<PathBuf>,
        timeout: Option<Duration>,
    },
    /// Copy matched sources into `dest`, keeping paths below the glob base.
    Copy { src: Vec<String>, dest: PathBuf },
    /// Concatenate matched sources into `dest/file`.
    Concat {
        src: Vec<String>,
        dest: PathBuf,
        file: String,
    },
}

impl TaskBody {
    /// Derive the body from a `[task.<name>]` section.
    ///
    /// Errors are plain messages; `config::validate` wraps them with the task
    /// name.
    pub fn from_config(cfg: &TaskConfig) -> Result<Self, String> {
        let declared = [cfg.cmd.is_some(), cfg.copy, cfg.concat.is_some()]
            .iter()
            .filter(|set| **set)
            .count();
        if declared > 1 {
            return Err("only one of `cmd`, `copy` and `concat` may be set".to_string());
        }

        if cfg.timeout.is_some() && cfg.cmd.is_none() {
            return Err("`timeout` only applies to `cmd` tasks".to_string());
        }

        if let Some(cmd) = &cfg.cmd {
            if cmd.trim().is_empty() {
                return Err("`cmd` must not be empty".to_string());
            }
            let timeout = cfg
                .timeout
                .as_deref()
                .map(parse_duration)
                .transpose()
                .map_err(|e| format!("invalid `timeout`: {e}"))?;
            return Ok(TaskBody::Command {
                cmd: cmd.clone(),
                src: cfg.src.clone(),
                dest: cfg.dest.as_ref().map(PathBuf::from),
                timeout,
            });
        }

        if cfg.copy || cfg.concat.is_some() {
            if cfg.src.iter().all(|p| p.starts_with('!')) {
                return Err("`copy`/`concat` tasks need at least one `src` pattern".to_string());
            }
            let dest = cfg
                .dest
                .as_ref()
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| "`copy`/`concat` tasks need a `dest` directory".to_string())?;

            return match &cfg.concat {
                Some(file) => {
                    if file.trim().is_empty() || file.contains('/') || file.contains('\\') {
                        return Err(format!("`concat` must be a plain file name (got '{file}')"));
                    }
                    Ok(TaskBody::Concat {
                        src: cfg.src.clone(),
                        dest,
                        file: file.clone(),
                    })
                }
                None => Ok(TaskBody::Copy {
                    src: cfg.src.clone(),
                    dest,
                }),
            };
        }

        if !cfg.src.is_empty() || cfg.dest.is_some() {
            return Err("`src`/`dest` given but the task has no `cmd`, `copy` or `concat`".to_string());
        }

        Ok(TaskBody::Group)
    }

    /// Short label used in listings and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskBody::Group => "group",
            TaskBody::Command { .. } => "cmd",
            TaskBody::Copy { .. } => "copy",
            TaskBody::Concat { .. } => "concat",
        }
    }

    pub fn sources(&self) -> &[String] {
        match self {
            TaskBody::Group => &[],
            TaskBody::Command { src, .. }
            | TaskBody::Copy { src, .. }
            | TaskBody::Concat { src, .. } => src,
        }
    }

    pub fn dest(&self) -> Option<&Path> {
        match self {
            TaskBody::Group => None,
            TaskBody::Command { dest, .. } => dest.as_deref(),
            TaskBody::Copy { dest, .. } | TaskBody::Concat { dest, .. } => Some(dest),
        }
    }
}

/// A registered task. Immutable once in the registry.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    pub name: TaskName,
    /// Direct dependencies (names in `after = [...]`).
    pub deps: Vec<TaskName>,
    pub body: TaskBody,
    /// Position in registration order; lower runs first among ready tasks.
    pub index: usize,
}

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Part of this run, waiting on dependencies.
    Pending,
    /// Handed to the backend and not yet completed.
    Running,
    DoneSuccess,
    DoneFailed,
    /// Never ran because a dependency failed.
    Skipped,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not part of this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Skipped,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// Description of a task that the scheduler wants the backend to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub body: TaskBody,
    /// Identifier shared by every task of one `Executor::run` call.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_definition(def: &TaskDefinition, run_id: u64) -> Self {
        Self {
            name: def.name.clone(),
            body: def.body.clone(),
            run_id,
        }
    }
}
