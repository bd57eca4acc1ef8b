// src/exec/backend.rs

//! Pluggable task backend abstraction.
//!
//! The [`Executor`](super::Executor) hands each scheduled task to a
//! `TaskBackend` and waits for its [`RunResult`]. Production code uses
//! [`ProcessBackend`]; tests swap in a fake that records the order in which
//! tasks were executed without touching the filesystem.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{error, info};

use crate::config::ConfigFile;
use crate::dag::{ScheduledTask, TaskBody};
use crate::exec::builtin::{concat_sources, copy_sources};
use crate::exec::interpolate::{interpolate, shell_quote};
use crate::exec::result::RunResult;
use crate::exec::sources::{SourceFile, SourceSet};
use crate::exec::task_runner::run_command;
use crate::fs::{FileSystem, RealFileSystem};

/// Trait abstracting how a scheduled task body is executed.
pub trait TaskBackend: Send + Sync {
    /// Run one task body to completion.
    ///
    /// Failures are reported through the returned result, never by panicking.
    fn execute<'a>(
        &'a self,
        task: &'a ScheduledTask,
    ) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>>;
}

/// Paths and limits every task body runs with.
#[derive(Debug, Clone)]
pub struct ExecContext {
    /// Project root; commands run here and globs resolve against it.
    pub root: PathBuf,
    /// Generated output directory, relative to `root`.
    pub site_root: PathBuf,
    /// Timeout for commands that do not set their own.
    pub default_timeout: Duration,
    pub fs: Arc<dyn FileSystem>,
}

impl ExecContext {
    pub fn from_config(cfg: &ConfigFile, root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            site_root: cfg.site_root().to_path_buf(),
            default_timeout: cfg.task_timeout(),
            fs: Arc::new(RealFileSystem),
        }
    }

    fn collect(&self, patterns: &[String]) -> Result<Vec<SourceFile>> {
        SourceSet::compile(patterns)?.collect(self.fs.as_ref(), &self.root)
    }
}

/// Backend that runs commands as child processes and built-in bodies on the
/// configured filesystem.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    ctx: ExecContext,
}

impl ProcessBackend {
    pub fn new(ctx: ExecContext) -> Self {
        Self { ctx }
    }

    async fn run_body(&self, task: &ScheduledTask, started: Instant) -> Result<RunResult> {
        let ctx = &self.ctx;

        match &task.body {
            TaskBody::Group => Ok(RunResult::succeeded(&task.name, Vec::new(), started.elapsed())),

            TaskBody::Copy { src, dest } => {
                let sources = ctx.collect(src)?;
                let outputs = copy_sources(ctx.fs.as_ref(), &sources, &ctx.root.join(dest))?;
                info!(task = %task.name, files = outputs.len(), "copy finished");
                Ok(RunResult::succeeded(&task.name, outputs, started.elapsed()))
            }

            TaskBody::Concat { src, dest, file } => {
                let sources = ctx.collect(src)?;
                let output = concat_sources(ctx.fs.as_ref(), &sources, &ctx.root.join(dest), file)?;
                info!(task = %task.name, files = sources.len(), "concat finished");
                Ok(RunResult::succeeded(&task.name, vec![output], started.elapsed()))
            }

            TaskBody::Command {
                cmd,
                src,
                dest,
                timeout,
            } => {
                let sources = ctx.collect(src)?;
                let quoted: Vec<String> = sources.iter().map(|s| shell_quote(&s.rel)).collect();

                let mut vars = HashMap::new();
                vars.insert("task", task.name.clone());
                vars.insert("sources", quoted.join(" "));
                vars.insert("site_root", shell_quote(&display(&ctx.site_root)));
                if let Some(dest) = dest {
                    vars.insert("dest", shell_quote(&display(dest)));
                }
                let line = interpolate(cmd, &vars);

                let limit = timeout.unwrap_or(ctx.default_timeout);
                let outcome = run_command(&task.name, &line, &ctx.root, limit).await?;

                if outcome.timed_out {
                    return Ok(RunResult::timed_out(
                        &task.name,
                        limit,
                        with_tail(format!("killed after {limit:?}"), outcome.stderr_tail),
                    ));
                }
                if !outcome.success {
                    let cause = match outcome.exit_code {
                        Some(code) => format!("command exited with code {code}"),
                        None => "command terminated by signal".to_string(),
                    };
                    return Ok(RunResult::failed(
                        &task.name,
                        with_tail(cause, outcome.stderr_tail),
                        started.elapsed(),
                    ));
                }

                let outputs = dest.iter().map(|d| ctx.root.join(d)).collect();
                Ok(RunResult::succeeded(&task.name, outputs, started.elapsed()))
            }
        }
    }
}

impl TaskBackend for ProcessBackend {
    fn execute<'a>(
        &'a self,
        task: &'a ScheduledTask,
    ) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>> {
        Box::pin(async move {
            let started = Instant::now();
            match self.run_body(task, started).await {
                Ok(result) => result,
                Err(err) => {
                    error!(task = %task.name, run_id = task.run_id, error = %format!("{err:#}"), "task execution error");
                    RunResult::failed(&task.name, vec![format!("{err:#}")], started.elapsed())
                }
            }
        })
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn with_tail(cause: String, tail: Vec<String>) -> Vec<String> {
    let mut diagnostics = Vec::with_capacity(tail.len() + 1);
    diagnostics.push(cause);
    diagnostics.extend(tail);
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::result::RunStatus;
    use crate::fs::mock::MockFileSystem;

    fn ctx(fs: Arc<MockFileSystem>) -> ExecContext {
        ExecContext {
            root: PathBuf::from("."),
            site_root: PathBuf::from("_site"),
            default_timeout: Duration::from_secs(10),
            fs,
        }
    }

    fn scheduled(name: &str, body: TaskBody) -> ScheduledTask {
        ScheduledTask {
            name: name.into(),
            body,
            run_id: 1,
        }
    }

    #[tokio::test]
    async fn copy_body_writes_outputs() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("./fonts/a.woff", "font");
        let backend = ProcessBackend::new(ctx(fs.clone()));

        let task = scheduled(
            "fonts",
            TaskBody::Copy {
                src: vec!["fonts/**/*".into()],
                dest: PathBuf::from("_site/fonts"),
            },
        );
        let result = backend.execute(&task).await;

        assert_eq!(result.status, RunStatus::Succeeded);
        assert_eq!(result.outputs, vec![PathBuf::from("./_site/fonts/a.woff")]);
        assert_eq!(fs.contents("./_site/fonts/a.woff").unwrap(), b"font");
    }

    #[tokio::test]
    async fn concat_without_matches_fails_with_diagnostic() {
        let fs = Arc::new(MockFileSystem::new());
        let backend = ProcessBackend::new(ctx(fs));

        let task = scheduled(
            "js",
            TaskBody::Concat {
                src: vec!["js/*.js".into()],
                dest: PathBuf::from("_site/js"),
                file: "scripts.js".into(),
            },
        );
        let result = backend.execute(&task).await;

        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.cause().contains("no source files"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_failure_reports_exit_code() {
        let backend = ProcessBackend::new(ctx(Arc::new(MockFileSystem::new())));
        let task = scheduled(
            "bad",
            TaskBody::Command {
                cmd: "echo '{task} broke' >&2; exit 4".into(),
                src: vec![],
                dest: None,
                timeout: None,
            },
        );
        let result = backend.execute(&task).await;

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.diagnostics[0], "command exited with code 4");
        assert_eq!(result.diagnostics[1], "bad broke");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_timeout_is_reported() {
        let backend = ProcessBackend::new(ctx(Arc::new(MockFileSystem::new())));
        let task = scheduled(
            "slow",
            TaskBody::Command {
                cmd: "sleep 5".into(),
                src: vec![],
                dest: None,
                timeout: Some(Duration::from_millis(100)),
            },
        );
        let result = backend.execute(&task).await;

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.timed_out, Some(Duration::from_millis(100)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dest_and_site_root_with_spaces_stay_one_argument() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ProcessBackend::new(ExecContext {
            root: dir.path().to_path_buf(),
            site_root: PathBuf::from("my site"),
            default_timeout: Duration::from_secs(10),
            fs: Arc::new(MockFileSystem::new()),
        });
        let task = scheduled(
            "spaced",
            TaskBody::Command {
                cmd: "mkdir -p {dest} && printf %s {site_root} > {dest}/root.txt".into(),
                src: vec![],
                dest: Some(PathBuf::from("out dir")),
                timeout: None,
            },
        );
        let result = backend.execute(&task).await;

        assert_eq!(result.status, RunStatus::Succeeded, "{}", result.cause());
        let written = std::fs::read_to_string(dir.path().join("out dir/root.txt")).unwrap();
        assert_eq!(written, "my site");
        assert!(!dir.path().join("out").exists());
    }
}
