// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling per-task `watch` patterns into [`GlobBinding`]s.
//! - Debouncing bursts of changes into one trigger per task.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It only turns filesystem changes into task-level triggers; running them
//! is up to the engine.

pub mod dag_filter;
pub mod debounce;
pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::Debouncer;
pub use event_handler::ChangeRouter;
pub use patterns::{GlobBinding, bindings_from_config};
pub use watcher::{WatcherHandle, spawn_watcher};
