// src/dag/registry.rs

//! Registry of named tasks.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::dag::graph::DagGraph;
use crate::dag::task_info::{TaskBody, TaskDefinition};
use crate::errors::{PipelineError, Result};
use crate::types::TaskName;

/// Holds every task known to the pipeline.
///
/// Tasks are registered once at start-up, dependencies before dependents, and
/// never mutated afterwards; the registry is then shared read-only.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskName, TaskDefinition>,
    /// Names in registration order.
    order: Vec<TaskName>,
    graph: DagGraph,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.
    ///
    /// Fails with:
    /// - `DuplicateTask` if `name` is already registered
    /// - `ConfigError` if the task lists itself as a dependency
    /// - `UnknownDependency` if a dependency has not been registered yet
    pub fn register(
        &mut self,
        name: impl Into<TaskName>,
        deps: Vec<TaskName>,
        body: TaskBody,
    ) -> Result<()> {
        let name = name.into();

        if self.tasks.contains_key(&name) {
            return Err(PipelineError::DuplicateTask(name));
        }

        for dep in &deps {
            if *dep == name {
                return Err(PipelineError::ConfigError(format!(
                    "task '{name}' cannot depend on itself"
                )));
            }
            if !self.tasks.contains_key(dep) {
                return Err(PipelineError::UnknownDependency {
                    task: name,
                    dependency: dep.clone(),
                });
            }
        }

        debug!(task = %name, ?deps, kind = body.kind(), "registering task");

        self.graph.insert(&name, &deps);
        let index = self.order.len();
        self.order.push(name.clone());
        self.tasks.insert(
            name.clone(),
            TaskDefinition {
                name,
                deps,
                body,
                index,
            },
        );
        Ok(())
    }

    /// Look up a registered task.
    pub fn resolve(&self, name: &str) -> Result<&TaskDefinition> {
        self.tasks
            .get(name)
            .ok_or_else(|| PipelineError::TaskNotFound(name.to_string()))
    }

    /// Build a registry from a validated config.
    ///
    /// Tasks are registered dependencies-first; among tasks that are ready at
    /// the same time, names sort alphabetically. This fixes the declaration
    /// order used to break ties at run time.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut remaining: HashMap<&str, Vec<&str>> = cfg
            .tasks()
            .iter()
            .map(|(name, t)| (name.as_str(), t.after.iter().map(String::as_str).collect()))
            .collect();

        let mut registry = TaskRegistry::new();

        while !remaining.is_empty() {
            let ready: BTreeSet<&str> = remaining
                .iter()
                .filter(|(_, deps)| deps.iter().all(|d| registry.tasks.contains_key(*d)))
                .map(|(name, _)| *name)
                .collect();

            // Validated configs never get here: petgraph's toposort already
            // rejected cycles. Configs built with `new_unchecked` still can.
            if ready.is_empty() {
                let mut stuck: Vec<&str> = remaining.keys().copied().collect();
                stuck.sort();
                return Err(PipelineError::DagCycle(format!(
                    "cycle detected in task DAG among tasks {:?}",
                    stuck
                )));
            }

            for name in ready {
                remaining.remove(name);
                let Some(task) = cfg.task(name) else {
                    continue;
                };
                let body = TaskBody::from_config(task).map_err(|e| {
                    PipelineError::ConfigError(format!("task '{name}': {e}"))
                })?;
                registry.register(name, task.after.clone(), body)?;
            }
        }

        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in registration order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Task definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }
}
