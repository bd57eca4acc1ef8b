// tests/watcher_debounce.rs
//
// Real filesystem watcher on a temp directory.

mod common;
use crate::common::{init_tracing, write_tree};

use std::time::Duration;

use sitepipe::dag::DagGraph;
use sitepipe::engine::{RuntimeEvent, TriggerReason};
use sitepipe::watch::{GlobBinding, spawn_watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

fn binding(task: &str, pattern: &str) -> GlobBinding {
    GlobBinding::new(task, &[pattern.to_string()], &[]).unwrap()
}

#[tokio::test]
async fn burst_of_writes_triggers_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("css/main.scss", "a {}")]);

    let (tx, mut rx) = mpsc::channel(16);
    let _watcher = spawn_watcher(
        dir.path(),
        "_site".as_ref(),
        vec![binding("sass", "css/**/*.scss")],
        DagGraph::new(),
        tx,
        Duration::from_millis(200),
    )
    .unwrap();
    sleep(Duration::from_millis(200)).await;

    for i in 0..5 {
        std::fs::write(dir.path().join("css/main.scss"), format!("a {{ z-index: {i}; }}")).unwrap();
        sleep(Duration::from_millis(20)).await;
    }

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no trigger within 5s")
        .expect("watcher channel closed");
    assert_eq!(
        event,
        RuntimeEvent::TaskTriggered {
            task: "sass".into(),
            reason: TriggerReason::FileWatch,
        }
    );

    assert!(
        timeout(Duration::from_millis(600), rx.recv()).await.is_err(),
        "burst produced more than one trigger"
    );
}

#[tokio::test]
async fn site_root_changes_are_ignored() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("_site/index.html", "<html>")]);

    let (tx, mut rx) = mpsc::channel(16);
    let _watcher = spawn_watcher(
        dir.path(),
        "_site".as_ref(),
        vec![binding("html", "**/*.html")],
        DagGraph::new(),
        tx,
        Duration::from_millis(50),
    )
    .unwrap();
    sleep(Duration::from_millis(200)).await;

    std::fs::write(dir.path().join("_site/index.html"), "<html>rebuilt</html>").unwrap();

    assert!(timeout(Duration::from_millis(600), rx.recv()).await.is_err());
}

#[tokio::test]
async fn stopped_watcher_sends_nothing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("img/logo.svg", "<svg/>")]);

    let (tx, mut rx) = mpsc::channel(16);
    let mut watcher = spawn_watcher(
        dir.path(),
        "_site".as_ref(),
        vec![binding("img", "img/**/*")],
        DagGraph::new(),
        tx,
        Duration::from_millis(50),
    )
    .unwrap();
    watcher.stop();

    std::fs::write(dir.path().join("img/logo.svg"), "<svg id=\"new\"/>").unwrap();

    // Sender dropped with the forwarding task: the channel closes instead of
    // delivering a trigger.
    let next = timeout(Duration::from_millis(600), rx.recv()).await;
    assert!(matches!(next, Ok(None) | Err(_)));
}
