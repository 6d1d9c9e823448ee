// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::default::DEFAULT_CONFIG;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{IoResultExt, Result};

/// A validated configuration together with the directory its relative
/// paths are resolved against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ConfigFile,
    pub project_root: PathBuf,
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).at_path(path)?;
    parse_str(&contents)
}

/// Parse TOML text into the raw model.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// The built-in configuration reproducing the stock `source/` → `build/`
/// layout.
pub fn builtin_config() -> Result<ConfigFile> {
    ConfigFile::try_from(parse_str(DEFAULT_CONFIG)?)
}

/// Resolve which configuration to use.
///
/// - An explicitly passed path must exist.
/// - Otherwise `Sitepipe.toml` in the working directory is used when present,
///   and the built-in configuration when it is not.
pub fn discover(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_and_validate(path)?;
        return Ok(LoadedConfig {
            config,
            project_root: config_root_dir(path),
        });
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        let config = load_and_validate(&default_path)?;
        return Ok(LoadedConfig {
            config,
            project_root: config_root_dir(&default_path),
        });
    }

    info!("no {} found; using the built-in layout", default_path.display());
    Ok(LoadedConfig {
        config: builtin_config()?,
        project_root: current_dir(),
    })
}

/// Default config file location, relative to the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sitepipe.toml")
}

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Sitepipe.toml"),
///   we use that directory.
/// - If it's just a bare filename, we fall back to the working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => current_dir(),
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
