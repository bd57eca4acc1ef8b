// tests/sample_config.rs
//
// The Sitepipe.toml shipped at the repository root must stay valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sitepipe::config::{ConfigFile, load_and_validate};
use sitepipe::dag::TaskRegistry;
use sitepipe::watch::{ChangeRouter, Debouncer, bindings_from_config};
use tokio::time::Instant;

fn sample() -> ConfigFile {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("Sitepipe.toml");
    load_and_validate(&path).unwrap()
}

#[test]
fn sample_config_loads_and_orders_tasks() {
    let cfg = sample();

    assert_eq!(cfg.default_task(), "build");
    assert_eq!(cfg.port(), 4000);

    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let order: Vec<&str> = registry.task_names().collect();
    assert_eq!(
        order,
        vec!["fonts", "img", "jekyll", "js", "sass", "html", "js-min", "build"]
    );

    let watched: Vec<String> = bindings_from_config(&cfg)
        .unwrap()
        .iter()
        .map(|b| b.task().to_string())
        .collect();
    assert_eq!(
        watched,
        vec!["fonts", "html", "img", "jekyll", "js", "js-min", "sass"]
    );
}

#[tokio::test(start_paused = true)]
async fn sample_changes_rebuild_the_final_outputs() {
    let cfg = sample();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let mut router = ChangeRouter::new(
        PathBuf::from("/site"),
        cfg.site_root(),
        bindings_from_config(&cfg).unwrap(),
        registry.graph().clone(),
        Debouncer::new(cfg.debounce()),
    );
    let settle = cfg.debounce() + Duration::from_millis(1);

    // A script change reaches the minified bundle; js runs as its dependency.
    let now = Instant::now();
    let matched = router.on_change(Path::new("/site/js/app.js"), now);
    assert!(matched.contains(&"js".to_string()));
    assert!(matched.contains(&"js-min".to_string()));
    assert_eq!(router.take_due(now + settle), vec!["js-min"]);

    // A post change reaches the minified HTML; jekyll runs as its dependency.
    let now = Instant::now();
    router.on_change(Path::new("/site/_posts/2024-01-01-hello.md"), now);
    assert_eq!(router.take_due(now + settle), vec!["html"]);
}
