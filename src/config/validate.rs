// src/config/validate.rs

use std::path::{Component, Path};
use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::TaskBody;
use crate::errors::{PipelineError, Result};
use crate::exec::sources::{build_globset, SourceSet};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let (debounce, task_timeout) = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.config,
            debounce,
            task_timeout,
            raw.task,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<(Duration, Duration)> {
    ensure_has_tasks(cfg)?;
    let durations = validate_global_config(cfg)?;
    validate_task_bodies(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(durations)
}

fn config_error(msg: impl Into<String>) -> PipelineError {
    PipelineError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<(Duration, Duration)> {
    let section = &cfg.config;

    if section.port == 0 {
        return Err(config_error("[config].port must be >= 1 (got 0)"));
    }

    check_relative_dir("[config].site_root", &section.site_root)?;

    let debounce = parse_duration(&section.debounce)
        .map_err(|e| config_error(format!("[config].debounce: {e}")))?;
    let task_timeout = parse_duration(&section.task_timeout)
        .map_err(|e| config_error(format!("[config].task_timeout: {e}")))?;
    if task_timeout.is_zero() {
        return Err(config_error("[config].task_timeout must be greater than zero"));
    }

    if let Some(default_task) = &section.default_task {
        if !cfg.task.contains_key(default_task) {
            return Err(config_error(format!(
                "[config].default_task refers to unknown task '{default_task}'"
            )));
        }
    }

    Ok((debounce, task_timeout))
}

/// Output directories must stay inside the project root and must not be the
/// root itself, since `clean` deletes the site root.
fn check_relative_dir(what: &str, dir: &str) -> Result<()> {
    let path = Path::new(dir);
    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => {
                return Err(config_error(format!(
                    "{what} must be a relative path inside the project (got '{dir}')"
                )));
            }
        }
    }
    if normal == 0 {
        return Err(config_error(format!(
            "{what} must name a directory below the project root (got '{dir}')"
        )));
    }
    Ok(())
}

fn validate_task_bodies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        let body = TaskBody::from_config(task)
            .map_err(|e| config_error(format!("task '{name}': {e}")))?;

        if let Some(dest) = body.dest() {
            check_relative_dir(
                &format!("task '{name}' dest"),
                &dest.to_string_lossy(),
            )?;
        }

        SourceSet::compile(&task.src)
            .map_err(|e| config_error(format!("task '{name}' src: {e:#}")))?;

        build_globset(&task.effective_watch())
            .and_then(|_| build_globset(&task.effective_watch_exclude()))
            .map_err(|e| config_error(format!("task '{name}' watch: {e:#}")))?;
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task
    // For:
    //   [task.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(PipelineError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                node
            )))
        }
    }
}
