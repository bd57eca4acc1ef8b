// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use crate::types::TaskName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must succeed before this one runs.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// In-memory DAG keyed by task name.
///
/// Nodes are only ever added after all of their dependencies (see
/// `TaskRegistry::register`), so the graph is acyclic by construction.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: HashMap<TaskName, DagNode>,
}

impl DagGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and link it as a dependent of each of its dependencies.
    ///
    /// Callers check that `name` is new and that every dependency exists.
    pub(crate) fn insert(&mut self, name: &str, deps: &[TaskName]) {
        for dep in deps {
            if let Some(dep_node) = self.nodes.get_mut(dep) {
                dep_node.dependents.push(name.to_string());
            }
        }
        self.nodes.insert(
            name.to_string(),
            DagNode {
                deps: deps.to_vec(),
                dependents: Vec::new(),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Return all task names (unordered).
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate dependencies of a task (the tasks listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one in their `after`).
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// `name` plus all of its transitive dependencies.
    pub fn closure_of(&self, name: &str) -> HashSet<TaskName> {
        let mut stack: Vec<&str> = vec![name];
        let mut seen: HashSet<TaskName> = HashSet::new();

        while let Some(current) = stack.pop() {
            if !self.contains(current) || !seen.insert(current.to_string()) {
                continue;
            }
            stack.extend(self.dependencies_of(current).iter().map(String::as_str));
        }

        seen
    }

    /// Whether `ancestor` is a transitive dependency of `task`.
    pub fn depends_on(&self, task: &str, ancestor: &str) -> bool {
        task != ancestor && self.closure_of(task).contains(ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> DagGraph {
        // a <- b, a <- c, (b, c) <- d
        let mut g = DagGraph::new();
        g.insert("a", &[]);
        g.insert("b", &["a".to_string()]);
        g.insert("c", &["a".to_string()]);
        g.insert("d", &["b".to_string(), "c".to_string()]);
        g
    }

    #[test]
    fn dependents_are_linked_on_insert() {
        let g = diamond();
        let mut dependents = g.dependents_of("a").to_vec();
        dependents.sort();
        assert_eq!(dependents, vec!["b", "c"]);
        assert_eq!(g.dependencies_of("d"), ["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn closure_contains_transitive_dependencies_only() {
        let g = diamond();
        let mut closure: Vec<_> = g.closure_of("b").into_iter().collect();
        closure.sort();
        assert_eq!(closure, vec!["a", "b"]);
        assert_eq!(g.closure_of("d").len(), 4);
        assert!(g.closure_of("missing").is_empty());
    }

    #[test]
    fn depends_on_is_transitive_and_irreflexive() {
        let g = diamond();
        assert!(g.depends_on("d", "a"));
        assert!(!g.depends_on("a", "d"));
        assert!(!g.depends_on("a", "a"));
    }
}
