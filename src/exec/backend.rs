// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to a `BindingExecutor` instead of running compositions
//! itself, so tests can swap in a fake that records dispatches and completes
//! them immediately.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::{BindingName, RuntimeEvent};
use crate::errors::{Result, SitepipeError};
use crate::pipeline::{BuildContext, Composition, Plan};
use crate::watch::WatchBinding;

use super::binding_runner::run_binding;

/// Trait abstracting how dispatched bindings are executed.
pub trait BindingExecutor: Send {
    /// Start one run of `binding`.
    ///
    /// Must not wait for the run to finish; completion is reported with a
    /// `RuntimeEvent::BindingCompleted`.
    fn dispatch(
        &mut self,
        binding: BindingName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor used in production: each binding's run list is resolved once
/// into a composition and spawned on every dispatch.
#[derive(Debug)]
pub struct PipelineExecutor {
    runs: HashMap<BindingName, Composition>,
    ctx: Arc<BuildContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl PipelineExecutor {
    pub fn new(
        plan: &Plan,
        bindings: &[WatchBinding],
        ctx: Arc<BuildContext>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Result<Self> {
        let runs = bindings
            .iter()
            .map(|b| Ok((b.name().to_string(), plan.resolve_sequence(b.run())?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self {
            runs,
            ctx,
            runtime_tx,
        })
    }
}

impl BindingExecutor for PipelineExecutor {
    fn dispatch(
        &mut self,
        binding: BindingName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let composition = self
                .runs
                .get(&binding)
                .cloned()
                .ok_or_else(|| SitepipeError::TaskNotFound(binding.clone()))?;

            tokio::spawn(run_binding(
                binding,
                composition,
                Arc::clone(&self.ctx),
                self.runtime_tx.clone(),
            ));
            Ok(())
        })
    }
}
