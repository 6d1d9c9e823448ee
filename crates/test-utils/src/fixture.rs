use std::fs;
use std::path::{Path, PathBuf};

use sitepipe::config::SitePaths;
use tempfile::TempDir;

/// A throwaway project directory with `source/` and (after a build)
/// `build/` inside.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("source")).expect("create source dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn build(&self) -> PathBuf {
        self.dir.path().join("build")
    }

    pub fn paths(&self) -> SitePaths {
        SitePaths::new(self.source(), self.build())
    }

    /// Write a file below `source/`, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.source().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write source file");
        path
    }

    /// Write a file below `build/` (e.g. a stale leftover).
    pub fn write_build(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.build().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write build file");
        path
    }

    pub fn read_build(&self, rel: &str) -> Vec<u8> {
        fs::read(self.build().join(rel)).expect("read build file")
    }

    pub fn build_exists(&self, rel: &str) -> bool {
        self.build().join(rel).exists()
    }

    /// Every file under `build/`, as sorted `/`-separated relative paths.
    pub fn build_files(&self) -> Vec<String> {
        let root = self.build();
        let mut out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&root) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    /// Every file under `build/` with its contents.
    pub fn build_snapshot(&self) -> Vec<(String, Vec<u8>)> {
        self.build_files()
            .into_iter()
            .map(|rel| {
                let contents = self.read_build(&rel);
                (rel, contents)
            })
            .collect()
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}
