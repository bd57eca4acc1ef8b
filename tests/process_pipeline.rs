// tests/process_pipeline.rs
//
// Runs real task bodies (shell commands, copy, concat) in a temp project.
#![cfg(unix)]

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{init_tracing, process_executor, snapshot, write_tree};

use std::path::Path;
use std::time::Duration;

use sitepipe::clean::clean;
use sitepipe::config::ConfigFile;
use sitepipe::errors::PipelineError;
use sitepipe::exec::RunStatus;
use sitepipe::fs::RealFileSystem;

fn project(root: &Path) {
    write_tree(
        root,
        &[
            ("css/base.css", "body { margin: 0; }"),
            ("css/nav.css", "nav { display: flex; }"),
            ("js/vendors/jquery.js", "/* jquery */"),
            ("js/app.js", "app();"),
            ("img/logo.svg", "<svg/>"),
            ("img/icons/menu.svg", "<svg id=\"menu\"/>"),
            ("index.html", "<html><body>home</body></html>"),
        ],
    );
}

fn pipeline() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task(
            "css",
            TaskConfigBuilder::cmd("mkdir -p {dest} && cat {sources} > {dest}/style.css")
                .src("css/*.css")
                .dest("_site/css")
                .build(),
        )
        .with_task(
            "js",
            TaskConfigBuilder::concat("_site/js", "scripts.js")
                .src("js/vendors/*.js")
                .src("js/**/*.js")
                .build(),
        )
        .with_task(
            "img",
            TaskConfigBuilder::copy("_site/img").src("img/**/*").build(),
        )
        .with_task(
            "html",
            TaskConfigBuilder::copy("_site").src("*.html").after("css").build(),
        )
        .with_task(
            "build",
            TaskConfigBuilder::group()
                .after("html")
                .after("js")
                .after("img")
                .build(),
        )
        .build()
}

#[tokio::test]
async fn build_produces_expected_site() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());

    let report = process_executor(&pipeline(), dir.path())
        .run("build")
        .await
        .unwrap();
    assert!(report.is_success(), "{report:?}");

    let site = snapshot(&dir.path().join("_site"));
    let names: Vec<&str> = site.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "css/style.css",
            "img/icons/menu.svg",
            "img/logo.svg",
            "index.html",
            "js/scripts.js"
        ]
    );
    assert_eq!(
        site["css/style.css"],
        b"body { margin: 0; }nav { display: flex; }".to_vec()
    );
    assert_eq!(site["js/scripts.js"], b"/* jquery */\napp();".to_vec());
}

#[tokio::test]
async fn clean_then_build_is_byte_identical() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let cfg = pipeline();
    let executor = process_executor(&cfg, dir.path());

    executor.run("build").await.unwrap().outcome().unwrap();
    let first = snapshot(&dir.path().join("_site"));

    assert!(clean(&RealFileSystem, dir.path(), cfg.site_root()).unwrap());
    assert!(!dir.path().join("_site").exists());

    executor.run("build").await.unwrap().outcome().unwrap();
    let second = snapshot(&dir.path().join("_site"));

    assert_eq!(first, second);
}

#[tokio::test]
async fn failing_command_reports_cause_and_skips_dependents() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .with_task(
            "sass",
            TaskConfigBuilder::cmd("echo 'Error: undefined variable' >&2; exit 65").build(),
        )
        .with_task("jekyll", TaskConfigBuilder::cmd("touch built").after("sass").build())
        .build();

    let report = process_executor(&cfg, dir.path()).run("jekyll").await.unwrap();

    assert_eq!(report.status_of("jekyll"), Some(RunStatus::Skipped));
    assert!(!dir.path().join("built").exists());
    let failure = report.first_failure().unwrap();
    assert_eq!(failure.task, "sass");
    assert_eq!(failure.diagnostics[0], "command exited with code 65");
    assert!(failure.diagnostics.iter().any(|l| l.contains("undefined variable")));
}

#[tokio::test]
async fn command_exceeding_timeout_is_killed() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .with_task("slow", TaskConfigBuilder::cmd("sleep 10").timeout("200ms").build())
        .with_task("after", TaskConfigBuilder::cmd("true").after("slow").build())
        .build();

    let started = std::time::Instant::now();
    let report = process_executor(&cfg, dir.path()).run("after").await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.status_of("after"), Some(RunStatus::Skipped));
    assert!(matches!(
        report.outcome(),
        Err(PipelineError::TaskTimeout { ref task, timeout })
            if task == "slow" && timeout == Duration::from_millis(200)
    ));
}

#[tokio::test]
async fn global_task_timeout_applies_without_task_override() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .task_timeout("150ms")
        .with_task("slow", TaskConfigBuilder::cmd("sleep 10").build())
        .build();

    let report = process_executor(&cfg, dir.path()).run("slow").await.unwrap();
    assert!(matches!(report.outcome(), Err(PipelineError::TaskTimeout { .. })));
}
