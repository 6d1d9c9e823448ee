// src/exec/binding_runner.rs

//! Runs one dispatched binding and reports how it ended.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::engine::{BindingName, RunOutcome, RuntimeEvent};
use crate::errors::SitepipeError;
use crate::pipeline::{BuildContext, Composition};

/// Run `composition` and send a `BindingCompleted` event.
///
/// Transform failures are logged and reported as `Failed` so watching
/// continues; any other error is `Fatal`.
pub async fn run_binding(
    binding: BindingName,
    composition: Composition,
    ctx: Arc<BuildContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(binding = %binding, run = %composition, "running watched tasks");
    let started = Instant::now();

    let outcome = match composition.run(ctx).await {
        Ok(()) => {
            info!(
                binding = %binding,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "watched tasks finished"
            );
            RunOutcome::Success
        }
        Err(err) => classify(&binding, &err),
    };

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::BindingCompleted { binding, outcome })
        .await
    {
        warn!("failed to send RuntimeEvent::BindingCompleted: {err}");
    }
}

fn classify(binding: &str, err: &SitepipeError) -> RunOutcome {
    if err.is_recoverable() {
        warn!(binding, error = %err, "watched task failed; still watching");
        RunOutcome::Failed
    } else {
        error!(binding, error = %err, "watched task hit a fatal error");
        RunOutcome::Fatal(err.to_string())
    }
}
