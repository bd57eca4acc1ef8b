// src/clean.rs

//! Removal of the generated site root.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// Lexically normalise `path`: drop `.` and fold `..` into the parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Delete `root/site_root` and everything below it.
///
/// Succeeds when the directory does not exist. Refuses (with `ConfigError`)
/// to delete the project root itself or anything outside it.
pub fn clean(fs: &dyn FileSystem, root: &Path, site_root: &Path) -> Result<bool> {
    let target = root.join(site_root);
    let target_norm = normalize(&target);
    let root_norm = normalize(root);

    if target_norm == root_norm || !target_norm.starts_with(&root_norm) {
        return Err(PipelineError::ConfigError(format!(
            "refusing to clean {:?}: not a directory below the project root {:?}",
            target, root
        )));
    }

    if !fs.exists(&target) {
        debug!(path = ?target, "nothing to clean");
        return Ok(false);
    }
    if !fs.is_dir(&target) {
        return Err(PipelineError::ConfigError(format!(
            "refusing to clean {target:?}: not a directory"
        )));
    }

    // Resolve symlinks before the final check so a linked site root cannot
    // point the removal elsewhere.
    if let (Ok(real_root), Ok(real_target)) = (fs.canonicalize(root), fs.canonicalize(&target)) {
        if real_target == real_root || !real_target.starts_with(&real_root) {
            return Err(PipelineError::ConfigError(format!(
                "refusing to clean {real_target:?}: resolves outside the project root"
            )));
        }
    }

    fs.remove_dir_all(&target)?;
    info!(path = ?target, "cleaned site root");
    Ok(true)
}
