// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Declarative asset pipeline for static sites: run tasks, watch sources, serve with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `$SITEPIPE_CONFIG`, else `Sitepipe.toml` in the current
    /// working directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a task after all of its dependencies.
    Run {
        /// Task to run; defaults to `[config].default_task` (or `build`).
        task: Option<String>,
    },

    /// Build, then rebuild on changes while serving the site with live reload.
    Watch {
        /// Do not start the dev server.
        #[arg(long)]
        no_serve: bool,

        /// Do not run the default task before watching.
        #[arg(long)]
        skip_initial: bool,
    },

    /// Serve the site root without building or watching.
    Serve,

    /// Delete the generated site root.
    Clean,

    /// Print tasks, dependencies and watch patterns without running anything.
    List,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_default_task() {
        let args = CliArgs::try_parse_from(["sitepipe", "run"]).unwrap();
        assert!(matches!(args.command, Command::Run { task: None }));
        assert!(args.config.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "sitepipe",
            "watch",
            "--no-serve",
            "--config",
            "site/Sitepipe.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Watch {
                no_serve: true,
                skip_initial: false
            }
        ));
        assert_eq!(args.config, Some(PathBuf::from("site/Sitepipe.toml")));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(CliArgs::try_parse_from(["sitepipe"]).is_err());
    }
}
