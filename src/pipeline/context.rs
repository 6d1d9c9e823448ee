// src/pipeline/context.rs

use std::sync::Arc;

use crate::config::SitePaths;
use crate::fs::{FileSystem, RealFileSystem};
use crate::server::reload::ReloadHub;

/// Everything a running task may touch, passed explicitly down the
/// composition tree.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub paths: SitePaths,
    /// Used for selecting source files.
    pub fs: Arc<dyn FileSystem>,
    reload: Option<ReloadHub>,
}

impl BuildContext {
    pub fn new(paths: SitePaths) -> Self {
        Self::with_fs(paths, Arc::new(RealFileSystem))
    }

    pub fn with_fs(paths: SitePaths, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            paths,
            fs,
            reload: None,
        }
    }

    /// Attach the dev server's client registry; `reload` tasks and streaming
    /// tasks signal through it.
    pub fn with_reload(mut self, hub: ReloadHub) -> Self {
        self.reload = Some(hub);
        self
    }

    pub fn reload(&self) -> Option<&ReloadHub> {
        self.reload.as_ref()
    }
}
