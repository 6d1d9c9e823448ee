// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Errors are split by how the rest of the system reacts to them:
//! - configuration problems are fatal before any task starts,
//! - transform failures fail the owning task (and are survivable in watch mode),
//! - IO failures are fatal everywhere.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown task or pipeline: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in pipeline graph: {0}")]
    PipelineCycle(String),

    #[error("transform `{transform}` failed on {}: {message}", path.display())]
    TransformError {
        transform: String,
        path: PathBuf,
        message: String,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SitepipeError {
    pub fn transform(
        transform: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl ToString,
    ) -> Self {
        SitepipeError::TransformError {
            transform: transform.into(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Only transform failures may be survived; a watched task that hits one
    /// is reported and the loop keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SitepipeError::TransformError { .. })
    }
}

/// Attach the offending path to a raw `std::io::Error`.
pub trait IoResultExt<T> {
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| SitepipeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
