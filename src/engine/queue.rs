// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use super::BindingName;
use crate::types::TriggerWhileRunningBehaviour;

/// What to do with a trigger for a binding that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyAction {
    /// Remembered; the binding runs once more after the current run.
    Queued,
    /// Dropped.
    Ignored,
    /// Start another run right away.
    Dispatch,
}

/// Triggers that arrive while their binding is running.
///
/// Semantics:
/// - Each binding has at most one pending rerun. Any number of triggers
///   received during a run coalesce into that single rerun (`queue` mode).
/// - `ignore` mode never stores anything.
/// - `overlap` mode never stores anything either; the caller dispatches.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    pending: BTreeSet<BindingName>,
}

impl TriggerQueue {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            pending: BTreeSet::new(),
        }
    }

    /// Returns true if there are no queued reruns.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Record that `binding` was triggered while one of its runs is in
    /// flight, and tell the caller what to do about it.
    pub fn record_trigger(&mut self, binding: &str) -> BusyAction {
        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                let inserted = self.pending.insert(binding.to_string());
                debug!(binding, inserted, "queued rerun (queue mode)");
                BusyAction::Queued
            }
            TriggerWhileRunningBehaviour::Ignore => {
                debug!(binding, "binding busy; dropping trigger (ignore mode)");
                BusyAction::Ignored
            }
            TriggerWhileRunningBehaviour::Overlap => BusyAction::Dispatch,
        }
    }

    /// Take the pending rerun for `binding`, if any.
    pub fn take(&mut self, binding: &str) -> bool {
        self.pending.remove(binding)
    }
}
