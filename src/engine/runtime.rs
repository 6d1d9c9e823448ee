// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::{Result, SitepipeError};
use crate::exec::BindingExecutor;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the core in response to `RuntimeEvent`s and delegates binding
/// runs to a `BindingExecutor`.
///
/// This is a pure IO shell around `CoreRuntime`, which holds all of the
/// trigger semantics.
pub struct Runtime<E: BindingExecutor> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: BindingExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: BindingExecutor> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// Returns `Ok` on shutdown (or when idle with `exit_when_idle`), and the
    /// error of the first fatal binding run otherwise.
    pub async fn run(mut self) -> Result<()> {
        info!("watch runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Dispatch(binding) => {
                debug!(binding = %binding, "dispatching binding");
                self.executor.dispatch(binding).await
            }
            CoreCommand::Abort(message) => {
                error!(error = %message, "fatal error in watched task");
                Err(SitepipeError::Other(anyhow::anyhow!(message)))
            }
        }
    }
}
