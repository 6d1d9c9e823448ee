// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) reads events from channels,
//! hands dispatched bindings to the executor and handles shutdown. The core
//! is unit tested without Tokio, channels, filesystem or a server.

use crate::engine::event_handlers::{
    CoreStep, RunningMap, handle_binding_completion, handle_binding_trigger,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::types::TriggerWhileRunningBehaviour;

/// Pure core runtime state.
///
/// This owns:
/// - the in-flight run count per binding
/// - the trigger queue
/// - runtime options (e.g. `exit_when_idle`)
#[derive(Debug)]
pub struct CoreRuntime {
    running: RunningMap,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, options: RuntimeOptions) -> Self {
        Self {
            running: RunningMap::new(),
            queue: TriggerQueue::new(behaviour),
            options,
        }
    }

    /// True when no binding is running.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of in-flight runs of `binding`.
    pub fn running_count(&self, binding: &str) -> usize {
        self.running.get(binding).copied().unwrap_or(0)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::BindingTriggered { binding } => {
                handle_binding_trigger(&mut self.running, &mut self.queue, binding)
            }
            RuntimeEvent::BindingCompleted { binding, outcome } => handle_binding_completion(
                &mut self.running,
                &mut self.queue,
                &self.options,
                binding,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
