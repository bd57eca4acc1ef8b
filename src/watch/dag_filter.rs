// src/watch/dag_filter.rs

//! DAG-aware filtering of watch triggers.
//!
//! Running a task also runs its transitive dependencies, so when both a task
//! and one of its dependents are triggered together, only the dependent needs
//! to run.

use std::collections::HashSet;

use crate::dag::DagGraph;
use crate::types::TaskName;

/// Drop every task that another triggered task already depends on.
///
/// Dependencies are followed through the whole task graph, including tasks
/// that have no watch patterns of their own. Keeps the input order of the
/// survivors.
pub fn drop_covered(triggered: Vec<TaskName>, graph: &DagGraph) -> Vec<TaskName> {
    let covered: HashSet<TaskName> = triggered
        .iter()
        .filter(|candidate| {
            triggered
                .iter()
                .any(|other| graph.depends_on(other, candidate))
        })
        .cloned()
        .collect();

    if covered.is_empty() {
        return triggered;
    }

    triggered
        .into_iter()
        .filter(|task| !covered.contains(task))
        .collect()
}
