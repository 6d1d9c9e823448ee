// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::watch::event_handler::{is_relevant, process_file_change};
use crate::watch::hash::ContentDigests;
use crate::watch::patterns::WatchBinding;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl WatcherHandle {
    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish()
    }
}

/// Spawn a recursive watcher on the source `root` that sends
/// `RuntimeEvent::BindingTriggered` for every binding matching a changed
/// path.
///
/// With `use_hash`, a binding only fires when the changed file's content
/// differs from what it saw last time.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    fs: Arc<dyn FileSystem>,
    use_hash: bool,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // The receiver only goes away when the loop below ends.
                let _ = event_tx.send(event);
            }
            Err(err) => eprintln!("sitepipe: file watch error: {err}"),
        },
        Config::default(),
    )
    .map_err(watch_error)?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(watch_error)?;

    info!(?root, bindings = bindings.len(), "file watcher started");

    let loop_root = root.clone();
    tokio::spawn(async move {
        let mut digests = use_hash.then(|| ContentDigests::new(fs));

        while let Some(event) = event_rx.recv().await {
            if !is_relevant(&event.kind) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in event.paths.iter() {
                let open = process_file_change(
                    &loop_root,
                    path,
                    &bindings,
                    digests.as_mut(),
                    &runtime_tx,
                )
                .await;
                if !open {
                    warn!("runtime gone; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        root,
    })
}

fn watch_error(err: notify::Error) -> SitepipeError {
    SitepipeError::Other(anyhow::Error::new(err).context("starting file watcher"))
}
