// src/engine/mod.rs

//! Watch-mode orchestration engine.
//!
//! This module ties together:
//! - per-binding run state (is a binding's run list in flight?)
//! - the trigger queue (what happens when a binding fires while it runs)
//! - the runtime event loop that reacts to:
//!   - file-watch triggers
//!   - binding completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical binding name type used throughout the engine (the binding's
/// watch pattern).
pub type BindingName = String;

/// How a binding run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// A transform failed; reported, watching continues.
    Failed,
    /// An error that must end the session (IO, configuration).
    Fatal(String),
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no binding is running and nothing is
    /// queued.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher and the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A watched file matching this binding changed.
    BindingTriggered { binding: BindingName },
    /// One run of the binding's run list finished.
    BindingCompleted {
        binding: BindingName,
        outcome: RunOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::{BusyAction, TriggerQueue};
pub use crate::types::TriggerWhileRunningBehaviour;
pub use runtime::Runtime;
