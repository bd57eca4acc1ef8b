// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::config::ConfigFile;
use crate::exec::sources::{build_globset, glob_base};
use crate::types::TaskName;
use crate::watch::path_utils::base_in_noise;

/// Compiled watch/exclude patterns bound to one task.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths like `"css/main.scss"` into [`GlobBinding::matches`].
#[derive(Clone)]
pub struct GlobBinding {
    task: TaskName,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    /// Literal directory prefixes of the watch patterns.
    bases: Vec<PathBuf>,
}

impl fmt::Debug for GlobBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobBinding")
            .field("task", &self.task)
            .field("bases", &self.bases)
            .finish_non_exhaustive()
    }
}

impl GlobBinding {
    pub fn new(task: impl Into<TaskName>, watch: &[String], exclude: &[String]) -> Result<Self> {
        let task = task.into();
        let watch_set = build_globset(watch)
            .with_context(|| format!("building watch globset for task {task}"))?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building exclude globset for task {task}"))?,
            )
        };

        Ok(Self {
            task,
            watch_set,
            exclude_set,
            bases: watch.iter().map(|p| glob_base(p)).collect(),
        })
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// Returns true if a change to `rel_path` should trigger this task.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Whether one of the patterns is rooted inside the site root or a hidden
    /// directory that contains `rel_path`.
    pub fn opts_into(&self, rel_path: &Path, site_root: &Path) -> bool {
        self.bases
            .iter()
            .any(|base| base_in_noise(base, site_root) && rel_path.starts_with(base))
    }
}

/// One binding per task with a non-empty effective watch list, in task name
/// order.
pub fn bindings_from_config(cfg: &ConfigFile) -> Result<Vec<GlobBinding>> {
    let mut bindings = Vec::new();

    for (name, task) in cfg.tasks() {
        let watch = task.effective_watch();
        if watch.is_empty() {
            continue;
        }
        bindings.push(GlobBinding::new(
            name.as_str(),
            &watch,
            &task.effective_watch_exclude(),
        )?);
    }

    Ok(bindings)
}
