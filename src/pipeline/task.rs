// src/pipeline/task.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::errors::{Result, SitepipeError};
use crate::pipeline::compose::{Job, JobFuture};
use crate::pipeline::context::BuildContext;
use crate::pipeline::stage::PipelineStage;
use crate::server::reload::{ReloadHub, ReloadMessage};
use crate::types::TaskKind;

#[derive(Debug)]
enum TaskAction {
    Clean,
    Reload,
    Stages {
        stages: Vec<PipelineStage>,
        /// Push written stylesheets to dev clients.
        stream: bool,
    },
}

/// A named unit of work, built from `[task.<name>]`.
#[derive(Debug)]
pub struct Task {
    name: String,
    action: TaskAction,
}

impl Task {
    pub fn from_config(name: &str, cfg: &TaskConfig) -> Result<Self> {
        let action = match cfg.kind {
            TaskKind::Clean => TaskAction::Clean,
            TaskKind::Reload => TaskAction::Reload,
            TaskKind::Stage => TaskAction::Stages {
                stages: cfg
                    .stage
                    .iter()
                    .map(PipelineStage::from_config)
                    .collect::<Result<Vec<_>>>()
                    .map_err(|e| SitepipeError::ConfigError(format!("task '{name}': {e}")))?,
                stream: cfg.stream,
            },
        };
        Ok(Self {
            name: name.to_string(),
            action,
        })
    }

    pub async fn execute(&self, ctx: &BuildContext) -> Result<()> {
        match &self.action {
            TaskAction::Clean => clean_build_root(&ctx.paths.build).await,
            TaskAction::Reload => {
                match ctx.reload() {
                    Some(hub) => {
                        let clients = broadcast(hub, ReloadMessage::Reload).await;
                        info!(clients, "reload broadcast");
                    }
                    None => debug!(task = %self.name, "no dev server; reload skipped"),
                }
                Ok(())
            }
            TaskAction::Stages { stages, stream } => {
                let mut written = Vec::new();
                for stage in stages.iter() {
                    written.extend(stage.run(ctx).await?);
                }
                debug!(task = %self.name, files = written.len(), "task outputs written");

                if *stream {
                    if let Some(hub) = ctx.reload() {
                        for path in written.iter().filter(|p| has_extension(p, "css")) {
                            if let Some(url) = url_path(&ctx.paths.build, path) {
                                let clients = broadcast(hub, ReloadMessage::Css { path: url }).await;
                                debug!(clients, ?path, "streamed stylesheet");
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl Job for Task {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Arc<Self>, ctx: Arc<BuildContext>) -> JobFuture {
        Box::pin(async move {
            let started = Instant::now();
            info!(task = %self.name, "starting task");
            let result = self.execute(&ctx).await;
            match &result {
                Ok(()) => info!(
                    task = %self.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "finished task"
                ),
                Err(err) => tracing::error!(task = %self.name, error = %err, "task failed"),
            }
            result
        })
    }
}

/// Recursively delete the build root. A missing root is not an error.
pub async fn clean_build_root(build: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(build).await {
        Ok(()) => {
            info!(path = ?build, "removed build root");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = ?build, "build root absent; nothing to clean");
            Ok(())
        }
        Err(source) => Err(SitepipeError::Io {
            path: build.to_path_buf(),
            source,
        }),
    }
}

/// Socket writes happen on the blocking pool, never on the task's thread.
async fn broadcast(hub: &ReloadHub, message: ReloadMessage) -> usize {
    let hub = hub.clone();
    tokio::task::spawn_blocking(move || hub.broadcast(&message))
        .await
        .unwrap_or(0)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// Server path of a file under the build root, e.g. `/css/style.min.css`.
fn url_path(build: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(build).ok()?;
    Some(format!("/{}", rel.to_string_lossy().replace('\\', "/")))
}
