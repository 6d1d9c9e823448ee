// src/watch/hash.rs

//! Content digests used to drop watch events that did not change anything
//! (editors that touch a file on save, duplicate notify events, ...).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blake3::Hasher;
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

/// Compute the hex digest of a file's contents.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs.read(path)?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen digest per (binding, file).
///
/// Keyed per binding so that two bindings watching the same file both get
/// to see its first change.
#[derive(Debug)]
pub struct ContentDigests {
    fs: Arc<dyn FileSystem>,
    seen: HashMap<(String, PathBuf), String>,
}

impl ContentDigests {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            seen: HashMap::new(),
        }
    }

    /// Record the current digest of `path` for `binding` and report whether
    /// it differs from the previous one.
    ///
    /// Missing or unreadable files always count as changed (and forget the
    /// stored digest), so deletions still trigger.
    pub fn changed(&mut self, binding: &str, path: &Path) -> bool {
        let key = (binding.to_string(), path.to_path_buf());

        let digest = match compute_file_hash(self.fs.as_ref(), path) {
            Ok(d) => d,
            Err(err) => {
                debug!(?path, error = %err, "cannot hash file; treating as changed");
                self.seen.remove(&key);
                return true;
            }
        };

        match self.seen.insert(key, digest.clone()) {
            Some(previous) if previous == digest => {
                debug!(binding, ?path, "content unchanged");
                false
            }
            _ => true,
        }
    }
}
