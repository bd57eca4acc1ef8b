// src/exec/sources.rs

//! Resolving `src` globs into concrete files.
//!
//! Patterns are relative to the project root. `*` and `?` stay inside one
//! path segment, `**` crosses segments, and a leading `!` excludes. Each
//! include pattern has a *glob base*: the literal directory prefix before the
//! first wildcard segment. Built-in bodies write outputs relative to it, so
//! `img/**/*` copies `img/logo/a.png` to `<dest>/logo/a.png`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Build a [`Glob`] with gulp-like separator semantics.
pub fn glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(glob(pat)?);
    }
    Ok(builder.build()?)
}

fn is_glob_segment(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// Literal directory prefix of `pattern` before its first wildcard segment.
///
/// A pattern without wildcards names a single file; its base is the parent
/// directory.
pub fn glob_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal = segments
        .iter()
        .position(|s| is_glob_segment(s))
        .unwrap_or(segments.len().saturating_sub(1));

    segments[..literal]
        .iter()
        .filter(|s| !s.is_empty() && **s != ".")
        .collect()
}

/// A resolved source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path (project root joined with `rel`).
    pub path: PathBuf,
    /// Path relative to the project root, with forward slashes.
    pub rel: String,
    /// Path relative to the glob base of the pattern that matched it.
    pub base_rel: PathBuf,
}

#[derive(Debug, Clone)]
struct IncludePattern {
    raw: String,
    base: PathBuf,
    matcher: GlobMatcher,
    literal: bool,
}

/// Compiled `src` list.
#[derive(Debug, Clone)]
pub struct SourceSet {
    include: Vec<IncludePattern>,
    exclude: Option<GlobSet>,
}

impl SourceSet {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for pat in patterns {
            let pat = pat.trim();
            if let Some(negated) = pat.strip_prefix('!') {
                exclude.push(negated.to_string());
                continue;
            }
            let pat = pat.strip_prefix("./").unwrap_or(pat);
            include.push(IncludePattern {
                raw: pat.to_string(),
                base: glob_base(pat),
                matcher: glob(pat)?.compile_matcher(),
                literal: !pat.split('/').any(is_glob_segment),
            });
        }

        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(&exclude)?)
        };

        Ok(Self { include, exclude })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    fn excluded(&self, rel: &str) -> bool {
        self.exclude.as_ref().is_some_and(|set| set.is_match(rel))
    }

    /// Collect matching files below `root`.
    ///
    /// Order is deterministic: patterns in declaration order, files sorted
    /// within each pattern, every file at most once.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SourceFile>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut files = Vec::new();

        for pattern in &self.include {
            let mut matched = Vec::new();

            if pattern.literal {
                let path = root.join(&pattern.raw);
                if fs.is_file(&path) {
                    matched.push(pattern.raw.clone());
                }
            } else {
                let start = if pattern.base.as_os_str().is_empty() {
                    root.to_path_buf()
                } else {
                    root.join(&pattern.base)
                };
                if fs.is_dir(&start) {
                    for path in walk_files(fs, &start)? {
                        if let Some(rel) = relative_str(root, &path) {
                            if pattern.matcher.is_match(&rel) {
                                matched.push(rel);
                            }
                        }
                    }
                }
            }

            matched.sort();
            for rel in matched {
                if self.excluded(&rel) || !seen.insert(rel.clone()) {
                    continue;
                }
                let base_rel = Path::new(&rel)
                    .strip_prefix(&pattern.base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(&rel));
                files.push(SourceFile {
                    path: root.join(&rel),
                    rel,
                    base_rel,
                });
            }
        }

        Ok(files)
    }
}

/// All files below `dir`, recursively.
fn walk_files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}
