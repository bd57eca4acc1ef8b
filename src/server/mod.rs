// src/server/mod.rs

//! Development HTTP server with live reload.
//!
//! Serves the generated site from the site root and keeps a Server-Sent
//! Events stream open per browser tab. After a successful rebuild the watch
//! session calls [`Reloader::notify_reload`] and every tab reloads itself.

pub mod static_files;

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::engine::ReloadNotifier;
use crate::errors::{PipelineError, Result};
use static_files::{RELOAD_PATH, content_type, inject_reload_script, is_html, resolve};

/// Message pushed to connected browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Reload,
    /// The server is going away; end every event stream.
    Close,
}

#[derive(Clone)]
struct AppState {
    root: Arc<PathBuf>,
    signals: broadcast::Sender<Signal>,
}

/// Cheap, cloneable handle for telling browsers to reload.
#[derive(Debug, Clone)]
pub struct Reloader {
    signals: broadcast::Sender<Signal>,
}

impl Reloader {
    /// Push a reload to every connected client; returns how many there were.
    pub fn notify_reload(&self) -> usize {
        let clients = self.signals.send(Signal::Reload).unwrap_or(0);
        info!(clients, "live reload sent");
        clients
    }
}

impl ReloadNotifier for Reloader {
    fn notify_reload(&self) -> usize {
        Reloader::notify_reload(self)
    }
}

/// Static file server for a directory.
#[derive(Debug, Clone)]
pub struct DevServer {
    root: PathBuf,
    port: u16,
}

impl DevServer {
    pub fn new(root: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            root: root.into(),
            port,
        }
    }

    /// Bind `127.0.0.1:<port>` and start serving in the background.
    ///
    /// Fails with `PortInUse` when the port is already bound. Port 0 picks a
    /// free port; see [`ServerHandle::local_addr`].
    pub async fn serve(self) -> Result<ServerHandle> {
        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::AddrInUse => PipelineError::PortInUse { port: self.port },
                _ => PipelineError::IoError(e),
            })?;
        let addr = listener.local_addr()?;

        let (signals, _) = broadcast::channel(16);
        let state = AppState {
            root: Arc::new(self.root.clone()),
            signals: signals.clone(),
        };

        let app = Router::new()
            .route(RELOAD_PATH, get(reload_events))
            .fallback(get(static_file))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                warn!(error = %e, "dev server stopped with error");
            }
        });

        info!(root = ?self.root, "dev server listening on http://{addr}");

        Ok(ServerHandle {
            addr,
            reloader: Reloader { signals },
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// A running dev server. Dropping the handle stops it.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    reloader: Reloader,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn reloader(&self) -> Reloader {
        self.reloader.clone()
    }

    pub fn notify_reload(&self) -> usize {
        self.reloader.notify_reload()
    }

    /// Close every event stream and wait for the server to stop.
    pub async fn shutdown(mut self) {
        let _ = self.reloader.signals.send(Signal::Close);
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(Duration::from_secs(5), task).await.is_err() {
                warn!("dev server did not stop in time");
            }
        }
        info!(addr = %self.addr, "dev server stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn reload_events(State(state): State<AppState>) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    debug!("live-reload client connected");
    let stream = BroadcastStream::new(state.signals.subscribe())
        .take_while(|signal| !matches!(signal, Ok(Signal::Close)))
        .map(|_| Ok::<_, Infallible>(Event::default().event("reload").data("reload")));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn static_file(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(path) = resolve(&state.root, uri.path()) else {
        debug!(path = %uri.path(), "404");
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = ?path, error = %e, "failed to read file");
            return (StatusCode::NOT_FOUND, "Not Found").into_response();
        }
    };

    let content_type = content_type(&path);
    if is_html(&path) {
        let html = inject_reload_script(&String::from_utf8_lossy(&bytes));
        return ([(header::CONTENT_TYPE, content_type)], html).into_response();
    }
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}
