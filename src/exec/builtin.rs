// src/exec/builtin.rs

//! Built-in task bodies that need no external program.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::exec::sources::SourceFile;
use crate::fs::FileSystem;

/// Copy every source into `dest`, keeping its path below the glob base.
///
/// Returns the written paths in source order.
pub fn copy_sources(fs: &dyn FileSystem, sources: &[SourceFile], dest: &Path) -> Result<Vec<PathBuf>> {
    let mut outputs = Vec::with_capacity(sources.len());

    for source in sources {
        let target = dest.join(&source.base_rel);
        let bytes = fs.read(&source.path)?;
        fs.write(&target, &bytes)
            .with_context(|| format!("copying {} to {:?}", source.rel, target))?;
        debug!(from = %source.rel, to = ?target, "copied");
        outputs.push(target);
    }

    Ok(outputs)
}

/// Join every source, separated by a newline, into `dest/file`.
pub fn concat_sources(
    fs: &dyn FileSystem,
    sources: &[SourceFile],
    dest: &Path,
    file: &str,
) -> Result<PathBuf> {
    if sources.is_empty() {
        bail!("no source files matched");
    }

    let mut joined = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        if i > 0 {
            joined.push(b'\n');
        }
        joined.extend(fs.read(&source.path)?);
    }

    let target = dest.join(file);
    fs.write(&target, &joined)
        .with_context(|| format!("writing {:?}", target))?;
    debug!(files = sources.len(), to = ?target, "concatenated");
    Ok(target)
}
