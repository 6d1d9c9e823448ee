// src/exec/mod.rs

//! Execution layer for watch mode.
//!
//! - [`backend`] provides the `BindingExecutor` trait and the production
//!   `PipelineExecutor`, which tests replace with a fake.
//! - [`binding_runner`] runs one binding's composition and reports its
//!   outcome back to the runtime.

pub mod backend;
pub mod binding_runner;

pub use backend::{BindingExecutor, PipelineExecutor};
pub use binding_runner::run_binding;
