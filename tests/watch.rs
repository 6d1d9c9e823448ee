// tests/watch.rs

mod common;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::EventKind;
use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
use tokio::sync::mpsc;
use tokio::time::timeout;

use sitepipe::config::builtin_config;
use sitepipe::engine::RuntimeEvent;
use sitepipe::fs::RealFileSystem;
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::watch::event_handler::{is_relevant, process_file_change};
use sitepipe::watch::{ContentDigests, WatchBinding, bindings_from_config, spawn_watcher};

use common::{SiteFixture, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

fn binding(pattern: &str, exclude: &[&str]) -> WatchBinding {
    let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
    WatchBinding::compile(pattern, &exclude).unwrap()
}

fn drain(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RuntimeEvent::BindingTriggered { binding } = event {
            out.push(binding);
        }
    }
    out
}

#[test]
fn binding_matches_relative_paths() {
    let styles = binding("less/**/*.less", &[]);

    assert!(styles.matches("less/style.less"));
    assert!(styles.matches("less/blocks/header.less"));
    assert!(!styles.matches("js/app.js"));
    assert!(!styles.matches("less/readme.md"));
}

#[test]
fn binding_exclusions_win() {
    let images = binding("img/**/*.svg", &["img/sprite/**"]);

    assert!(images.matches("img/logo.svg"));
    assert!(!images.matches("img/sprite/cart.svg"));
}

#[test]
fn builtin_bindings_are_compiled_from_config() -> TestResult {
    let bindings = bindings_from_config(&builtin_config()?)?;

    let names: Vec<_> = bindings.iter().map(|b| b.name().to_string()).collect();
    assert_eq!(names, vec!["less/**/*.less", "js/*.js", "*.html"]);
    assert_eq!(bindings[2].run(), ["html".to_string(), "reload".to_string()]);
    Ok(())
}

#[test]
fn only_content_events_are_relevant() {
    assert!(is_relevant(&EventKind::Create(CreateKind::File)));
    assert!(is_relevant(&EventKind::Modify(ModifyKind::Any)));
    assert!(is_relevant(&EventKind::Remove(RemoveKind::File)));
    assert!(!is_relevant(&EventKind::Access(AccessKind::Any)));
}

#[test]
fn digests_skip_unchanged_content() {
    let fs = MockFileSystem::new();
    fs.add_file("./less/style.less", "@c: red;");
    let mut digests = ContentDigests::new(Arc::new(fs.clone()));
    let path = Path::new("./less/style.less");

    assert!(digests.changed("styles", path));
    assert!(!digests.changed("styles", path));

    fs.add_file("./less/style.less", "@c: blue;");
    assert!(digests.changed("styles", path));
    assert!(!digests.changed("styles", path));
}

#[test]
fn digests_are_tracked_per_binding() {
    let fs = MockFileSystem::new();
    fs.add_file("./index.html", "<p>hi</p>");
    let mut digests = ContentDigests::new(Arc::new(fs));
    let path = Path::new("./index.html");

    assert!(digests.changed("html", path));
    assert!(digests.changed("all", path));
    assert!(!digests.changed("html", path));
}

#[test]
fn deleted_files_always_count_as_changed() {
    let fs = MockFileSystem::new();
    fs.add_file("./js/app.js", "let a = 1;");
    let mut digests = ContentDigests::new(Arc::new(fs.clone()));
    let path = Path::new("./js/app.js");

    assert!(digests.changed("scripts", path));
    fs.remove_file(path);
    assert!(digests.changed("scripts", path));
    assert!(digests.changed("scripts", path));

    // Re-created with the old content: the stored digest was forgotten.
    fs.add_file(path, "let a = 1;");
    assert!(digests.changed("scripts", path));
}

#[tokio::test]
async fn change_triggers_every_matching_binding() -> TestResult {
    let bindings = vec![
        binding("less/**/*.less", &[]),
        binding("js/*.js", &[]),
        binding("**/*", &["**/*.md"]),
    ];
    let (tx, mut rx) = mpsc::channel(16);

    let open = process_file_change(
        Path::new("."),
        Path::new("./less/blocks/header.less"),
        &bindings,
        None,
        &tx,
    )
    .await;

    assert!(open);
    assert_eq!(drain(&mut rx), vec!["less/**/*.less", "**/*"]);
    Ok(())
}

#[tokio::test]
async fn unchanged_content_does_not_trigger_again() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./js/app.js", "let a = 1;");
    let mut digests = ContentDigests::new(Arc::new(fs.clone()));
    let bindings = vec![binding("js/*.js", &[])];
    let (tx, mut rx) = mpsc::channel(16);
    let path = Path::new("./js/app.js");

    process_file_change(Path::new("."), path, &bindings, Some(&mut digests), &tx).await;
    process_file_change(Path::new("."), path, &bindings, Some(&mut digests), &tx).await;
    assert_eq!(drain(&mut rx), vec!["js/*.js"]);

    fs.add_file(path, "let a = 2;");
    process_file_change(Path::new("."), path, &bindings, Some(&mut digests), &tx).await;
    assert_eq!(drain(&mut rx), vec!["js/*.js"]);
    Ok(())
}

#[tokio::test]
async fn paths_outside_the_root_are_ignored() -> TestResult {
    let bindings = vec![binding("**/*", &[])];
    let (tx, mut rx) = mpsc::channel(16);

    let open = process_file_change(
        Path::new("/definitely/not/a/root"),
        Path::new("/elsewhere/file.txt"),
        &bindings,
        None,
        &tx,
    )
    .await;

    assert!(open);
    assert!(drain(&mut rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn closed_runtime_channel_stops_processing() -> TestResult {
    let bindings = vec![binding("**/*", &[])];
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let open = process_file_change(Path::new("."), Path::new("./a.txt"), &bindings, None, &tx).await;

    assert!(!open);
    Ok(())
}

#[tokio::test]
async fn watcher_triggers_only_the_binding_for_the_changed_file() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    site.write("less/style.less", "@c: red;");
    site.write("js/app.js", "let a = 1;");

    let bindings = vec![binding("less/**/*.less", &[]), binding("js/*.js", &[])];
    let (tx, mut rx) = mpsc::channel(64);
    let _watcher = spawn_watcher(site.source(), bindings, tx, Arc::new(RealFileSystem), true)?;

    // Give the backend a moment to register the watch.
    tokio::time::sleep(Duration::from_millis(200)).await;
    site.write("less/style.less", "@c: blue;");

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await?
        .expect("watcher channel closed");
    match event {
        RuntimeEvent::BindingTriggered { binding } => assert_eq!(binding, "less/**/*.less"),
        other => panic!("unexpected event {other:?}"),
    }

    // Nothing for the scripts binding shows up afterwards.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(drain(&mut rx).iter().all(|b| b == "less/**/*.less"));
    Ok(())
}
