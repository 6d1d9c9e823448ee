// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `[[binding]]` glob patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optionally dropping events whose file content did not change.
//!
//! It does **not** know about tasks or pipelines; it only turns filesystem
//! changes into binding-level triggers.

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use hash::{ContentDigests, compute_file_hash};
pub use patterns::{WatchBinding, bindings_from_config};
pub use watcher::{WatcherHandle, spawn_watcher};
