// src/pipeline/mod.rs

//! Tasks and their composition.
//!
//! - [`stage`]: select files, run them through transforms, write outputs.
//! - [`task`]: a named unit (stages, clean or reload).
//! - [`compose`]: series/parallel trees of jobs.
//! - [`plan`]: turns `[task]` and `[pipeline]` config into compositions.

pub mod compose;
pub mod context;
pub mod plan;
pub mod stage;
pub mod task;

pub use compose::{Composition, Job, JobFuture};
pub use context::BuildContext;
pub use plan::Plan;
pub use stage::PipelineStage;
pub use task::{Task, clean_build_root};
