// src/config/paths.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::errors::{Result, SitepipeError};

/// Source and build roots resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    /// Input tree. Read-only during a build.
    pub source: PathBuf,
    /// Output tree. Destroyed and regenerated by `clean`.
    pub build: PathBuf,
}

impl SitePaths {
    pub fn new(source: impl Into<PathBuf>, build: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            build: build.into(),
        }
    }

    /// Resolve `[paths]` against `project_root` and check them.
    ///
    /// The source root has to exist, and the build root must not be the
    /// source root or one of its ancestors (clean would wipe the sources).
    pub fn resolve(cfg: &ConfigFile, project_root: &Path) -> Result<Self> {
        let source = normalize(&project_root.join(&cfg.paths().source));
        let build = normalize(&project_root.join(&cfg.paths().build));

        if !source.is_dir() {
            return Err(SitepipeError::ConfigError(format!(
                "source root {} does not exist or is not a directory",
                source.display()
            )));
        }

        if source.starts_with(&build) {
            return Err(SitepipeError::ConfigError(format!(
                "build root {} must not contain the source root {}",
                build.display(),
                source.display()
            )));
        }

        Ok(Self { source, build })
    }
}

/// Lexically fold `.` and `..` components so prefix checks are meaningful
/// for paths that may not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
