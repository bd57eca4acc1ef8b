// src/watch/event_handler.rs

//! Turning changed paths into debounced task triggers.

use std::path::{Component, Path, PathBuf};

use tokio::time::Instant;
use tracing::debug;

use crate::dag::DagGraph;
use crate::types::TaskName;
use crate::watch::dag_filter::drop_covered;
use crate::watch::debounce::Debouncer;
use crate::watch::path_utils::{is_noise, relative_str};
use crate::watch::patterns::GlobBinding;

/// Routes file changes to the tasks bound to them.
///
/// 1. Relativize the changed path against the project root.
/// 2. Skip site-root and hidden-directory noise unless a binding opts in.
/// 3. Record every matching task in the debouncer.
/// 4. When tasks become due, drop those another due task depends on.
#[derive(Debug)]
pub struct ChangeRouter {
    root: PathBuf,
    site_root: PathBuf,
    bindings: Vec<GlobBinding>,
    /// The full task graph, unwatched tasks included.
    graph: DagGraph,
    debouncer: Debouncer,
}

impl ChangeRouter {
    pub fn new(
        root: PathBuf,
        site_root: &Path,
        bindings: Vec<GlobBinding>,
        graph: DagGraph,
        debouncer: Debouncer,
    ) -> Self {
        let site_root = site_root
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();

        Self {
            root,
            site_root,
            bindings,
            graph,
            debouncer,
        }
    }

    /// Record a change to `path` seen at `now`. Returns the matching tasks.
    pub fn on_change(&mut self, path: &Path, now: Instant) -> Vec<TaskName> {
        let rel_str = match relative_str(&self.root, path) {
            Some(s) if !s.is_empty() => s,
            _ => {
                debug!(?path, root = ?self.root, "change outside the project root");
                return Vec::new();
            }
        };
        let rel = Path::new(&rel_str);
        let noise = is_noise(rel, &self.site_root);

        let matched: Vec<TaskName> = self
            .bindings
            .iter()
            .filter(|b| !noise || b.opts_into(rel, &self.site_root))
            .filter(|b| b.matches(&rel_str))
            .map(|b| b.task().to_string())
            .collect();

        for task in &matched {
            self.debouncer.record(task, now);
        }
        if !matched.is_empty() {
            debug!(rel = %rel_str, tasks = ?matched, "watch match");
        }
        matched
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    /// Tasks whose debounce window elapsed by `now`, minus those covered by
    /// another due task.
    pub fn take_due(&mut self, now: Instant) -> Vec<TaskName> {
        let due = self.debouncer.take_due(now);
        if due.is_empty() {
            return due;
        }
        let kept = drop_covered(due.clone(), &self.graph);
        if kept.len() != due.len() {
            debug!(?due, ?kept, "DAG-aware filter: dropping dependencies of other triggers");
        }
        kept
    }
}
