// src/lib.rs

pub mod clean;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod server;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, default_config_path, load_and_validate, project_root};
use crate::dag::TaskRegistry;
use crate::engine::{Runtime, RuntimeEvent, TriggerReason};
use crate::errors::Result;
use crate::exec::{ExecContext, Executor, ProcessBackend, RunReport};
use crate::fs::RealFileSystem;
use crate::server::DevServer;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, builds the task registry, then dispatches
/// to the selected subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let root = project_root(&config_path);
    let cfg = load_and_validate(&config_path)?;
    info!(config = ?config_path, root = ?root, tasks = cfg.tasks().len(), "config loaded");

    match args.command {
        Command::Run { task } => {
            let target = task.unwrap_or_else(|| cfg.default_task().to_string());
            let executor = build_executor(&cfg, &root)?;
            let report = executor.run(&target).await?;
            print_report(&report);
            report.outcome()
        }
        Command::Watch {
            no_serve,
            skip_initial,
        } => watch_session(&cfg, &root, !no_serve, !skip_initial).await,
        Command::Serve => serve(&cfg, &root).await,
        Command::Clean => {
            let removed = clean::clean(&RealFileSystem, &root, cfg.site_root())?;
            if removed {
                println!("removed {}", cfg.site_root().display());
            } else {
                println!("nothing to clean");
            }
            Ok(())
        }
        Command::List => {
            let registry = TaskRegistry::from_config(&cfg)?;
            print_list(&cfg, &registry);
            Ok(())
        }
    }
}

fn build_executor(cfg: &ConfigFile, root: &Path) -> Result<Executor<ProcessBackend>> {
    let registry = Arc::new(TaskRegistry::from_config(cfg)?);
    Ok(executor_for(cfg, root, registry))
}

fn executor_for(cfg: &ConfigFile, root: &Path, registry: Arc<TaskRegistry>) -> Executor<ProcessBackend> {
    let backend = ProcessBackend::new(ExecContext::from_config(cfg, root));
    Executor::new(registry, backend)
}

/// Long-running watch session: initial build, dev server, watcher, rebuilds.
async fn watch_session(cfg: &ConfigFile, root: &Path, with_server: bool, initial: bool) -> Result<()> {
    let registry = Arc::new(TaskRegistry::from_config(cfg)?);
    let executor = executor_for(cfg, root, Arc::clone(&registry));

    let server = if with_server {
        Some(DevServer::new(root.join(cfg.site_root()), cfg.port()).serve().await?)
    } else {
        None
    };

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let bindings = watch::bindings_from_config(cfg)?;
    if bindings.is_empty() {
        warn!("no task declares watch patterns; nothing will be rebuilt on change");
    }
    let mut watcher = watch::spawn_watcher(
        root.to_path_buf(),
        cfg.site_root(),
        bindings,
        registry.graph().clone(),
        rt_tx.clone(),
        cfg.debounce(),
    )?;

    spawn_ctrl_c(rt_tx.clone());

    if initial {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task: cfg.default_task().to_string(),
                reason: TriggerReason::Initial,
            })
            .await
            .map_err(|e| anyhow::anyhow!("queueing initial build: {e}"))?;
    }

    let mut runtime = Runtime::new(rt_rx, executor);
    if let Some(server) = &server {
        runtime = runtime.with_reload(Arc::new(server.reloader()));
    }
    let summary = runtime.run().await;

    watcher.stop();
    if let Some(server) = server {
        server.shutdown().await;
    }
    println!(
        "watch session ended: {} runs, {} failed",
        summary.runs, summary.failed_runs
    );
    Ok(())
}

async fn serve(cfg: &ConfigFile, root: &Path) -> Result<()> {
    let site = root.join(cfg.site_root());
    if !site.is_dir() {
        warn!(path = ?site, "site root does not exist yet; run a build first");
    }
    let server = DevServer::new(site, cfg.port()).serve().await?;
    println!("serving on http://{} (Ctrl-C to stop)", server.local_addr());

    tokio::signal::ctrl_c().await?;
    server.shutdown().await;
    Ok(())
}

/// Ctrl-C → graceful shutdown.
fn spawn_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}

fn print_report(report: &RunReport) {
    for result in &report.results {
        let detail = match result.status {
            exec::RunStatus::Succeeded => format!("{:.2?}", result.elapsed),
            _ => result.cause(),
        };
        println!("{:>8}  {}  ({detail})", result.status.to_string(), result.task);
    }
    println!(
        "{} '{}' in {:.2?}",
        if report.is_success() { "finished" } else { "failed" },
        report.target,
        report.elapsed
    );
}

/// Print tasks in registration order without running anything.
fn print_list(cfg: &ConfigFile, registry: &TaskRegistry) {
    println!("sitepipe tasks (run order, default '{}')", cfg.default_task());
    println!("  site_root = {}", cfg.site_root().display());
    println!("  port = {}", cfg.port());
    println!();

    for def in registry.definitions() {
        let Some(task) = cfg.task(&def.name) else {
            continue;
        };
        match &task.description {
            Some(desc) => println!("  - {} [{}]  {desc}", def.name, def.body.kind()),
            None => println!("  - {} [{}]", def.name, def.body.kind()),
        }
        if !def.deps.is_empty() {
            println!("      after: {:?}", def.deps);
        }
        if let Some(cmd) = &task.cmd {
            println!("      cmd: {cmd}");
        }
        if let Some(file) = &task.concat {
            println!("      concat: {file}");
        }
        if !task.src.is_empty() {
            println!("      src: {:?}", task.src);
        }
        if let Some(dest) = def.body.dest() {
            println!("      dest: {}", dest.display());
        }
        let watch = task.effective_watch();
        if !watch.is_empty() {
            println!("      watch: {watch:?}");
        }
    }
}
