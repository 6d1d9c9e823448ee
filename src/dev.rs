// src/dev.rs

//! The `dev` command: build once, serve the build tree, rebuild on change.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{ConfigFile, ServerSection, SitePaths};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::Result;
use crate::exec::PipelineExecutor;
use crate::fs::RealFileSystem;
use crate::pipeline::{BuildContext, Plan};
use crate::server::{DevServer, ReloadHub, ServeOptions};
use crate::types::DevState;
use crate::watch::{WatcherHandle, bindings_from_config, spawn_watcher};

/// Owns everything a dev session keeps alive: the HTTP server, the reload
/// client registry and the file watcher. Dropping it tears all of them down.
#[derive(Debug)]
pub struct DevSession {
    state: DevState,
    server: Option<DevServer>,
    hub: Option<ReloadHub>,
    watcher: Option<WatcherHandle>,
}

impl Default for DevSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DevSession {
    pub fn new() -> Self {
        Self {
            state: DevState::Idle,
            server: None,
            hub: None,
            watcher: None,
        }
    }

    pub fn state(&self) -> DevState {
        self.state
    }

    pub fn server_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.as_ref().map(DevServer::addr)
    }

    pub fn hub(&self) -> Option<&ReloadHub> {
        self.hub.as_ref()
    }

    /// Start the reload channel and the HTTP server on `build_root`.
    pub fn serve(&mut self, cfg: &ServerSection, build_root: &Path) -> Result<ReloadHub> {
        let hub = ReloadHub::bind(&cfg.host, cfg.reload_port)?;
        let server = DevServer::start(
            &cfg.host,
            cfg.port,
            ServeOptions {
                root: build_root.to_path_buf(),
                cors: cfg.cors,
                reload_port: Some(hub.port()),
            },
        )?;

        self.hub = Some(hub.clone());
        self.server = Some(server);
        self.transition(DevState::Serving);
        Ok(hub)
    }

    /// Keep `watcher` alive for the rest of the session.
    pub fn watch(&mut self, watcher: WatcherHandle) {
        self.watcher = Some(watcher);
        self.transition(DevState::Watching);
    }

    /// Stop watching, close every client and stop the listener.
    pub fn shutdown(&mut self) {
        if self.server.is_none() && self.hub.is_none() && self.watcher.is_none() {
            return;
        }
        self.watcher = None;
        if let Some(hub) = self.hub.take() {
            hub.shutdown();
        }
        if let Some(mut server) = self.server.take() {
            server.shutdown();
        }
        info!("dev session stopped");
    }

    fn transition(&mut self, next: DevState) {
        info!(from = ?self.state, to = ?next, "dev session state");
        self.state = next;
    }
}

impl Drop for DevSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run the `dev` pipeline, then serve and watch until Ctrl-C.
///
/// A transform failure in the initial build is reported and the session
/// starts anyway, so fixing the file triggers a rebuild.
pub async fn run_dev(cfg: &ConfigFile, paths: SitePaths) -> Result<()> {
    let plan = Plan::from_config(cfg)?;
    let dev = plan.resolve("dev")?;

    info!(pipeline = %dev, "initial build");
    let build_ctx = Arc::new(BuildContext::new(paths.clone()));
    if let Err(err) = dev.run(build_ctx).await {
        if !err.is_recoverable() {
            return Err(err);
        }
        warn!(error = %err, "initial build failed; watching for a fix");
    }

    let mut session = DevSession::new();
    let hub = session.serve(cfg.server(), &paths.build)?;
    let ctx = Arc::new(BuildContext::new(paths.clone()).with_reload(hub));

    let bindings = bindings_from_config(cfg)?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = PipelineExecutor::new(&plan, &bindings, ctx, rt_tx.clone())?;

    let watcher = spawn_watcher(
        &paths.source,
        bindings,
        rt_tx.clone(),
        Arc::new(RealFileSystem),
        cfg.watch().use_hash,
    )?;
    session.watch(watcher);

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(
        cfg.watch().triggered_while_running_behaviour,
        RuntimeOptions::default(),
    );
    let result = Runtime::new(core, rt_rx, executor).run().await;

    session.shutdown();
    result
}
