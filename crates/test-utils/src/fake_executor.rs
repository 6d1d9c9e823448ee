use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitepipe::engine::{BindingName, RunOutcome, RuntimeEvent};
use sitepipe::errors::{Result, SitepipeError};
use sitepipe::exec::BindingExecutor;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which bindings were dispatched, in order
/// - immediately reports `BindingCompleted` with a scripted outcome
///   (`Success` unless overridden per binding).
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    outcomes: HashMap<BindingName, RunOutcome>,
    /// When false, dispatches are recorded but never completed, so tests
    /// can drive completions by hand.
    auto_complete: bool,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            outcomes: HashMap::new(),
            auto_complete: true,
        }
    }

    pub fn with_outcome(mut self, binding: &str, outcome: RunOutcome) -> Self {
        self.outcomes.insert(binding.to_string(), outcome);
        self
    }

    pub fn manual(mut self) -> Self {
        self.auto_complete = false;
        self
    }
}

impl BindingExecutor for FakeExecutor {
    fn dispatch(
        &mut self,
        binding: BindingName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let outcome = self
            .outcomes
            .get(&binding)
            .cloned()
            .unwrap_or(RunOutcome::Success);
        let auto_complete = self.auto_complete;

        Box::pin(async move {
            executed.lock().unwrap().push(binding.clone());

            if auto_complete {
                tx.send(RuntimeEvent::BindingCompleted { binding, outcome })
                    .await
                    .map_err(|e| SitepipeError::Other(anyhow::Error::from(e)))?;
            }
            Ok(())
        })
    }
}
