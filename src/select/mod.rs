// src/select/mod.rs

//! File selection: glob patterns (with `!` negation) resolved against a
//! source tree into an ordered snapshot of matching files.

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;

/// One file picked by a [`FileSelector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Path relative to the root the selector ran against.
    pub rel_path: PathBuf,
    /// Static prefix of the pattern that selected this file.
    pub glob_base: PathBuf,
}

impl SelectedFile {
    /// Path of the file below `base`, or below its glob base when `base` is
    /// `None`.
    pub fn relative_to_base(&self, base: Option<&Path>) -> PathBuf {
        let base = base.unwrap_or(&self.glob_base);
        let base = if base == Path::new(".") { Path::new("") } else { base };
        self.rel_path
            .strip_prefix(base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.rel_path.clone())
    }
}

/// Compiled include/exclude globs.
///
/// Patterns are matched against `/`-separated paths relative to the root;
/// `*` does not cross directory boundaries, `**` does.
#[derive(Clone)]
pub struct FileSelector {
    include: GlobSet,
    /// Glob base for each include pattern, index-aligned with `include`.
    bases: Vec<PathBuf>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for FileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSelector")
            .field("bases", &self.bases)
            .finish_non_exhaustive()
    }
}

impl FileSelector {
    /// Compile a pattern list. Entries starting with `!` are exclusions.
    ///
    /// Fails on invalid glob syntax or when no include pattern is given.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut bases = Vec::new();
        let mut has_exclude = false;

        for pat in patterns.iter().map(AsRef::as_ref) {
            if let Some(negated) = pat.strip_prefix('!') {
                exclude.add(compile_glob(negated)?);
                has_exclude = true;
            } else {
                include.add(compile_glob(pat)?);
                bases.push(glob_base(pat));
            }
        }

        if bases.is_empty() {
            return Err(SitepipeError::ConfigError(
                "a file selection needs at least one non-negated pattern".to_string(),
            ));
        }

        Ok(Self {
            include: include.build()?,
            bases,
            exclude: if has_exclude { Some(exclude.build()?) } else { None },
        })
    }

    /// Index of the first include pattern matching `rel_path`, unless the
    /// path is excluded.
    pub fn matching_pattern(&self, rel_path: &str) -> Option<usize> {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return None;
            }
        }
        self.include.matches(rel_path).into_iter().min()
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matching_pattern(rel_path).is_some()
    }

    /// Walk `root` and return every matching file, sorted by path.
    ///
    /// This is a snapshot taken at call time. An empty result is not an error.
    pub fn select(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SelectedFile>> {
        let mut files = Vec::new();
        if !fs.is_dir(root) {
            return Ok(files);
        }

        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Ok(rel) = path.strip_prefix(root) else {
                        continue;
                    };
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if let Some(idx) = self.matching_pattern(&rel_str) {
                        files.push(SelectedFile {
                            rel_path: PathBuf::from(rel_str),
                            glob_base: self.bases[idx].clone(),
                        });
                    }
                }
            }
        }

        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Ok(files)
    }
}

/// Build a glob where `*` stops at `/`, matching shell semantics.
pub(crate) fn compile_glob(pattern: &str) -> Result<Glob> {
    Ok(GlobBuilder::new(pattern).literal_separator(true).build()?)
}

/// Build a set of globs compiled with [`compile_glob`].
pub(crate) fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat.as_ref())?);
    }
    Ok(builder.build()?)
}

/// The leading directories of `pattern` that contain no glob syntax.
///
/// `img/**/*.svg` → `img`, `less/style.less` → `less`, `*.html` → ``.
pub fn glob_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut base = PathBuf::new();
    // The last segment is the file part even when it is literal.
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if segment.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(segment);
    }
    base
}
