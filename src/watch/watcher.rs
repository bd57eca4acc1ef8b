// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::debounce::Debouncer;
use crate::watch::event_handler::ChangeRouter;
use crate::watch::patterns::GlobBinding;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` and the forwarding task alive.
/// Dropping the handle (or calling [`WatcherHandle::stop`]) stops watching.
pub struct WatcherHandle {
    inner: Option<RecommendedWatcher>,
    forward: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("active", &self.inner.is_some())
            .finish()
    }
}

impl WatcherHandle {
    /// Stop watching and end the forwarding task.
    pub fn stop(&mut self) {
        if self.inner.take().is_some() {
            info!("file watcher stopped");
        }
        if let Some(task) = self.forward.take() {
            task.abort();
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// `RuntimeEvent::TaskTriggered` for bound tasks once their debounce window
/// has passed.
///
/// - `root` is the project root against which all glob patterns are evaluated.
/// - `site_root` is the generated output directory, relative to `root`.
/// - `bindings` is the compiled per-task pattern set.
/// - `graph` is the full task graph, used to drop triggers another due
///   trigger already covers.
/// - `runtime_tx` is the channel into the watch-session runtime.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    site_root: &Path,
    bindings: Vec<GlobBinding>,
    graph: DagGraph,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    debounce: std::time::Duration,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watch event dropped; forwarding task has ended");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = ?root, tasks = bindings.len(), ?debounce, "file watcher started");

    let router = ChangeRouter::new(root, site_root, bindings, graph, Debouncer::new(debounce));
    let forward = tokio::spawn(forward_events(router, event_rx, runtime_tx));

    Ok(WatcherHandle {
        inner: Some(watcher),
        forward: Some(forward),
    })
}

/// Consume notify events, debounce them, and forward due triggers.
async fn forward_events(
    mut router: ChangeRouter,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    loop {
        let deadline = router.next_deadline();

        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                if matches!(event.kind, EventKind::Access(_)) {
                    continue;
                }
                let now = Instant::now();
                for path in &event.paths {
                    router.on_change(path, now);
                }
            }
            _ = sleep_until(deadline) => {
                for task in router.take_due(Instant::now()) {
                    info!(task = %task, "change detected; triggering task");
                    let event = RuntimeEvent::TaskTriggered {
                        task,
                        reason: TriggerReason::FileWatch,
                    };
                    if runtime_tx.send(event).await.is_err() {
                        debug!("runtime channel closed; stopping watcher loop");
                        return;
                    }
                }
            }
        }
    }
    debug!("watcher event loop finished");
}

/// Sleep until `deadline`, or forever if there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
