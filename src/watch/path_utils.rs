// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// A direct `strip_prefix(root)` is tried first. If that fails (symlinks,
/// `/private/var` vs `/var` on macOS) both paths are canonicalized and the
/// strip is retried. Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

fn is_hidden(component: Component<'_>) -> bool {
    match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    }
}

/// Whether `rel` lies in the generated site root or inside a hidden
/// directory such as `.git`. Such changes are usually our own output or
/// tool noise and would otherwise retrigger builds forever.
pub fn is_noise(rel: &Path, site_root: &Path) -> bool {
    if !site_root.as_os_str().is_empty() && rel.starts_with(site_root) {
        return true;
    }
    rel.parent()
        .is_some_and(|dir| dir.components().any(is_hidden))
}

/// Whether a glob base names a directory that [`is_noise`] would filter,
/// meaning the pattern opted in to watching it.
pub fn base_in_noise(base: &Path, site_root: &Path) -> bool {
    if base.as_os_str().is_empty() {
        return false;
    }
    (!site_root.as_os_str().is_empty() && base.starts_with(site_root))
        || base.components().any(is_hidden)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_use_forward_slashes() {
        assert_eq!(
            relative_str(Path::new("/proj"), Path::new("/proj/css/main.scss")),
            Some("css/main.scss".to_string())
        );
        assert_eq!(relative_str(Path::new("/proj"), Path::new("/elsewhere/x")), None);
    }

    #[test]
    fn site_root_and_hidden_dirs_are_noise() {
        let site = Path::new("_site");
        assert!(is_noise(Path::new("_site/index.html"), site));
        assert!(is_noise(Path::new(".git/HEAD"), site));
        assert!(is_noise(Path::new("css/.cache/x"), site));
        assert!(!is_noise(Path::new("css/main.scss"), site));
        assert!(!is_noise(Path::new(".htaccess"), site));
    }

    #[test]
    fn bases_inside_noise() {
        let site = Path::new("_site");
        assert!(base_in_noise(Path::new("_site/css"), site));
        assert!(base_in_noise(Path::new(".well-known"), site));
        assert!(!base_in_noise(Path::new(""), site));
        assert!(!base_in_noise(Path::new("css"), site));
    }
}
