// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::engine::queue::{BusyAction, TriggerQueue};
use crate::engine::{BindingName, RunOutcome, RuntimeOptions};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Run the binding's run list once.
    Dispatch(BindingName),
    /// Stop the session with this error.
    Abort(String),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// In-flight run count per binding. Only `overlap` mode ever goes above 1.
pub(crate) type RunningMap = BTreeMap<BindingName, usize>;

/// Handle a binding trigger.
///
/// - Idle binding: dispatch it.
/// - Busy binding: the queue decides (coalesce, drop, or overlap).
pub fn handle_binding_trigger(
    running: &mut RunningMap,
    queue: &mut TriggerQueue,
    binding: BindingName,
) -> CoreStep {
    let in_flight = running.get(&binding).copied().unwrap_or(0);

    if in_flight == 0 {
        running.insert(binding.clone(), 1);
        return CoreStep::continue_with(vec![CoreCommand::Dispatch(binding)]);
    }

    let commands = match queue.record_trigger(&binding) {
        BusyAction::Dispatch => {
            debug!(binding = %binding, in_flight, "overlapping run");
            running.insert(binding.clone(), in_flight + 1);
            vec![CoreCommand::Dispatch(binding)]
        }
        BusyAction::Queued | BusyAction::Ignored => Vec::new(),
    };

    CoreStep::continue_with(commands)
}

/// Handle a binding completion.
pub fn handle_binding_completion(
    running: &mut RunningMap,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    binding: BindingName,
    outcome: RunOutcome,
) -> CoreStep {
    if let RunOutcome::Fatal(message) = outcome {
        return CoreStep {
            commands: vec![CoreCommand::Abort(message)],
            keep_running: false,
        };
    }

    let remaining = match running.get_mut(&binding) {
        Some(count) => {
            *count = count.saturating_sub(1);
            *count
        }
        None => {
            warn!(binding = %binding, "completion for a binding that is not running");
            0
        }
    };

    let mut commands = Vec::new();
    if remaining == 0 {
        running.remove(&binding);
        if queue.take(&binding) {
            debug!(binding = %binding, "starting queued rerun");
            running.insert(binding.clone(), 1);
            commands.push(CoreCommand::Dispatch(binding));
        }
    }

    let keep_running = !(options.exit_when_idle && running.is_empty() && queue.is_empty());

    CoreStep {
        commands,
        keep_running,
    }
}
