// src/watch/patterns.rs

use std::fmt;

use globset::GlobSet;

use crate::config::model::{BindingConfig, ConfigFile};
use crate::errors::Result;
use crate::select::{build_globset, compile_glob};

/// Compiled `[[binding]]` pattern.
///
/// Patterns are relative to the source root. The watcher passes relative
/// paths (e.g. `"less/blocks/header.less"`) into `matches`.
#[derive(Clone)]
pub struct WatchBinding {
    /// The pattern as written in the config; doubles as the binding's name.
    name: String,
    pattern: globset::GlobMatcher,
    exclude: Option<GlobSet>,
    run: Vec<String>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    /// Compile a pattern plus its exclusions. The run list is empty; use
    /// [`WatchBinding::from_config`] for a fully wired binding.
    pub fn compile(pattern: &str, exclude: &[String]) -> Result<Self> {
        let matcher = compile_glob(pattern)?.compile_matcher();
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude)?)
        };

        Ok(Self {
            name: pattern.to_string(),
            pattern: matcher,
            exclude,
            run: Vec::new(),
        })
    }

    pub fn from_config(cfg: &BindingConfig) -> Result<Self> {
        let mut binding = Self::compile(&cfg.pattern, &cfg.exclude)?;
        binding.run = cfg.run.clone();
        Ok(binding)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Task and pipeline names this binding runs, in order.
    pub fn run(&self) -> &[String] {
        &self.run
    }

    /// Returns true if this binding is interested in `rel_path`.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.pattern.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile every `[[binding]]` of a validated config.
pub fn bindings_from_config(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    cfg.bindings().iter().map(WatchBinding::from_config).collect()
}
