#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use sitepipe::config::ConfigFile;
use sitepipe::dag::TaskRegistry;
use sitepipe::exec::{ExecContext, Executor, ProcessBackend};

pub use sitepipe_test_utils::builders;
pub use sitepipe_test_utils::fake_backend::FakeBackend;
pub use sitepipe_test_utils::{init_tracing, with_timeout};

/// Executor over `cfg` with the given backend.
pub fn executor_with<B: sitepipe::exec::TaskBackend>(cfg: &ConfigFile, backend: B) -> Executor<B> {
    let registry = Arc::new(TaskRegistry::from_config(cfg).expect("registry from valid config"));
    Executor::new(registry, backend)
}

/// Executor that really runs commands and file operations below `root`.
pub fn process_executor(cfg: &ConfigFile, root: &Path) -> Executor<ProcessBackend> {
    executor_with(cfg, ProcessBackend::new(ExecContext::from_config(cfg, root)))
}

/// Write `files` (relative path → contents) below `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

/// Every file below `dir` as relative path → bytes.
pub fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/");
                out.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }
    out
}
