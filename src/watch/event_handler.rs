// src/watch/event_handler.rs

//! Turns one changed path into binding triggers.

use std::path::Path;

use notify::EventKind;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::RuntimeEvent;
use crate::watch::hash::ContentDigests;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBinding;

/// Whether a notify event can change what a build would produce.
pub fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Process a single changed path.
///
/// 1. Relativize it against the source root.
/// 2. Find every binding whose pattern matches.
/// 3. With `digests`, skip bindings for which the content did not change.
/// 4. Send a trigger per remaining binding.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_file_change(
    root: &Path,
    path: &Path,
    bindings: &[WatchBinding],
    digests: Option<&mut ContentDigests>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    let Some(rel) = relative_str(root, path) else {
        warn!(?path, ?root, "could not relativize path against source root");
        return true;
    };

    let mut digests = digests;
    for binding in bindings.iter().filter(|b| b.matches(&rel)) {
        if let Some(digests) = digests.as_deref_mut() {
            if !digests.changed(binding.name(), path) {
                debug!(binding = binding.name(), path = %rel, "content unchanged; skipping");
                continue;
            }
        }

        debug!(binding = binding.name(), path = %rel, "watch match -> triggering binding");
        if let Err(err) = runtime_tx
            .send(RuntimeEvent::BindingTriggered {
                binding: binding.name().to_string(),
            })
            .await
        {
            warn!("failed to send RuntimeEvent::BindingTriggered: {err}");
            return false;
        }
    }
    true
}
