// src/config/model.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::types::TaskName;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// site_root = "_site"
/// port = 4000
///
/// [task.sass]
/// cmd = "sass {sources} {dest}/style.css"
/// src = ["css/main.scss"]
/// watch = ["css/**/*.scss"]
/// dest = "_site/css"
///
/// [task.build]
/// after = ["sass"]
/// ```
///
/// This is the unvalidated form; use [`ConfigFile`] everywhere else.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<TaskName, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Generated output directory, relative to the project root.
    #[serde(default = "default_site_root")]
    pub site_root: String,

    /// Port the dev server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Quiet period after the last matching file change before a task runs.
    #[serde(default = "default_debounce")]
    pub debounce: String,

    /// Timeout applied to `cmd` tasks that do not set their own.
    #[serde(default = "default_task_timeout")]
    pub task_timeout: String,

    /// Task used by `run` without an argument and by `watch` at start-up.
    ///
    /// If unset, `"build"` is used when such a task exists.
    #[serde(default)]
    pub default_task: Option<TaskName>,
}

fn default_site_root() -> String {
    "_site".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_debounce() -> String {
    "200ms".to_string()
}

fn default_task_timeout() -> String {
    "10m".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            site_root: default_site_root(),
            port: default_port(),
            debounce: default_debounce(),
            task_timeout: default_task_timeout(),
            default_task: None,
        }
    }
}

/// `[task.<name>]` section.
///
/// At most one of `cmd`, `copy` and `concat` may be set. A task with none of
/// them is a group that only exists to pull in its `after` dependencies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Free-form text shown by `sitepipe list`.
    #[serde(default)]
    pub description: Option<String>,

    /// Shell command to run. Supports `{task}`, `{sources}`, `{dest}` and
    /// `{site_root}` placeholders.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Copy every source file into `dest`, keeping paths relative to the
    /// glob base.
    #[serde(default)]
    pub copy: bool,

    /// Concatenate all source files into `dest/<concat>`.
    #[serde(default)]
    pub concat: Option<String>,

    /// Source globs, relative to the project root. `!pattern` excludes.
    #[serde(default)]
    pub src: Vec<String>,

    /// Destination directory, relative to the project root.
    #[serde(default)]
    pub dest: Option<String>,

    /// Globs that re-trigger this task in `watch`. Defaults to the positive
    /// `src` patterns when omitted.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Dependency list: this task runs after all tasks listed here.
    #[serde(default)]
    pub after: Vec<TaskName>,

    /// Per-task timeout for `cmd` tasks (e.g. `"30s"`).
    #[serde(default)]
    pub timeout: Option<String>,
}

impl TaskConfig {
    /// Effective watch patterns: explicit `watch`, else the non-negated `src`.
    pub fn effective_watch(&self) -> Vec<String> {
        match &self.watch {
            Some(list) => list.clone(),
            None => self
                .src
                .iter()
                .filter(|p| !p.starts_with('!'))
                .cloned()
                .collect(),
        }
    }

    /// Exclusions shared with `src` (the `!pattern` entries), applied to
    /// watch matching as well.
    pub fn effective_watch_exclude(&self) -> Vec<String> {
        self.src
            .iter()
            .filter_map(|p| p.strip_prefix('!'))
            .map(str::to_string)
            .collect()
    }
}

/// Validated configuration.
///
/// Constructed only through [`TryFrom<RawConfigFile>`] (see
/// `config::validate`), so every holder can rely on:
/// - known, non-self `after` references
/// - an acyclic task graph
/// - compilable globs and well-formed task bodies
/// - parsed durations
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    debounce: Duration,
    task_timeout: Duration,
    task: BTreeMap<TaskName, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        debounce: Duration,
        task_timeout: Duration,
        task: BTreeMap<TaskName, TaskConfig>,
    ) -> Self {
        Self {
            config,
            debounce,
            task_timeout,
            task,
        }
    }

    /// Site root relative to the project root.
    pub fn site_root(&self) -> &Path {
        Path::new(&self.config.site_root)
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn task_timeout(&self) -> Duration {
        self.task_timeout
    }

    /// Task to run when none is named on the command line.
    pub fn default_task(&self) -> &str {
        self.config.default_task.as_deref().unwrap_or("build")
    }

    pub fn tasks(&self) -> &BTreeMap<TaskName, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }
}
