// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Provide the built-in layout (`default.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate references, pipeline acyclicity and glob syntax (`validate.rs`).
//! - Resolve the source and build roots (`paths.rs`).

pub mod default;
pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{builtin_config, discover, load_and_validate, load_from_path, parse_str, LoadedConfig};
pub use model::{
    BindingConfig, CompositionSpec, ConfigFile, PathsSection, RawConfigFile, ServerSection,
    StageConfig, TaskConfig, TransformKind, TransformOptions, TransformSpec, WatchSection,
};
pub use paths::SitePaths;
