use std::collections::BTreeMap;

use sitepipe::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use sitepipe::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn site_root(mut self, dir: &str) -> Self {
        self.config.config.site_root = dir.to_string();
        self
    }

    pub fn debounce(mut self, window: &str) -> Self {
        self.config.config.debounce = window.to_string();
        self
    }

    pub fn task_timeout(mut self, timeout: &str) -> Self {
        self.config.config.task_timeout = timeout.to_string();
        self
    }

    pub fn default_task(mut self, name: &str) -> Self {
        self.config.config.default_task = Some(name.to_string());
        self
    }

    /// Validate without panicking, for tests that expect a config error.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A group task: no body, only dependencies.
    pub fn group() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    /// A shell command task.
    pub fn cmd(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A `copy = true` task into `dest`.
    pub fn copy(dest: &str) -> Self {
        Self {
            task: TaskConfig {
                copy: true,
                dest: Some(dest.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A `concat = "<file>"` task into `dest`.
    pub fn concat(dest: &str, file: &str) -> Self {
        Self {
            task: TaskConfig {
                concat: Some(file.to_string()),
                dest: Some(dest.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn dest(mut self, dir: &str) -> Self {
        self.task.dest = Some(dir.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.task
            .watch
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.task.timeout = Some(timeout.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
