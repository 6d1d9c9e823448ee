// src/server/reload.rs

//! Live-reload signalling over WebSocket.
//!
//! [`ReloadHub`] is the registry of connected dev clients. It owns the
//! listener thread and every client socket; shutting it down closes them
//! all.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::errors::{Result, SitepipeError};

/// Maximum port binding attempts.
pub const MAX_PORT_RETRIES: u16 = 10;

const ACCEPT_POLL: Duration = Duration::from_millis(50);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Message pushed to dev clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
    /// Swap one stylesheet in place, e.g. `/css/style.min.css`.
    Css { path: String },
}

impl ReloadMessage {
    pub fn to_json(&self) -> String {
        // Unit and string-only variants always serialise.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

struct HubInner {
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
    addr: SocketAddr,
    shutdown: AtomicBool,
}

/// Shared handle to the client registry. Cheap to clone.
#[derive(Clone)]
pub struct ReloadHub {
    inner: Arc<HubInner>,
}

impl std::fmt::Debug for ReloadHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadHub")
            .field("addr", &self.inner.addr)
            .field("clients", &self.client_count())
            .finish()
    }
}

impl ReloadHub {
    /// Bind the WebSocket listener on `host`, trying up to
    /// [`MAX_PORT_RETRIES`] successive ports from `base_port`. Port 0 lets
    /// the OS choose.
    pub fn bind(host: &str, base_port: u16) -> Result<Self> {
        let listener = bind_with_retry(host, base_port)?;
        let addr = listener.local_addr().map_err(|e| listener_error(host, base_port, e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| listener_error(host, base_port, e))?;

        let inner = Arc::new(HubInner {
            clients: Mutex::new(Vec::new()),
            addr,
            shutdown: AtomicBool::new(false),
        });

        let acceptor = Arc::clone(&inner);
        thread::Builder::new()
            .name("sitepipe-reload".to_string())
            .spawn(move || accept_loop(listener, acceptor))
            .map_err(|e| listener_error(host, base_port, e))?;

        info!(%addr, "reload channel listening");
        Ok(Self { inner })
    }

    pub fn addr(&self) -> SocketAddr {
        self.inner.addr
    }

    pub fn port(&self) -> u16 {
        self.inner.addr.port()
    }

    pub fn client_count(&self) -> usize {
        self.inner.clients.lock().len()
    }

    /// Send `message` to every client, dropping those that fail. Returns
    /// how many clients received it.
    ///
    /// Client sockets are non-blocking: a client whose socket buffer is full
    /// has stopped reading and is dropped rather than waited on.
    pub fn broadcast(&self, message: &ReloadMessage) -> usize {
        let json = message.to_json();
        let mut clients = self.inner.clients.lock();
        let before = clients.len();

        clients.retain_mut(|ws| match ws.send(Message::Text(json.clone().into())) {
            Ok(()) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                warn!("dropping stalled reload client");
                false
            }
            Err(err) => {
                debug!(error = %err, "dropping dead reload client");
                false
            }
        });

        let delivered = clients.len();
        debug!(message = %json, delivered, dropped = before - delivered, "broadcast");
        delivered
    }

    /// Stop accepting and close every client connection.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut clients = self.inner.clients.lock();
        for mut ws in clients.drain(..) {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
        debug!("reload channel closed");
    }
}

fn accept_loop(listener: TcpListener, hub: Arc<HubInner>) {
    while !hub.shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                // Blocking for the handshake, non-blocking afterwards so a
                // client that stops reading never stalls a broadcast.
                let _ = stream.set_nonblocking(false);
                let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
                match tungstenite::accept(stream) {
                    Ok(ws) => {
                        if let Err(err) = ws.get_ref().set_nonblocking(true) {
                            warn!(%peer, error = %err, "reload client rejected");
                            continue;
                        }
                        let mut clients = hub.clients.lock();
                        clients.push(ws);
                        debug!(%peer, total = clients.len(), "reload client connected");
                    }
                    Err(err) => warn!(%peer, error = %err, "reload handshake failed"),
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(err) => {
                warn!(error = %err, "reload accept error");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn bind_with_retry(host: &str, base_port: u16) -> Result<TcpListener> {
    let attempts = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };
    let mut last_error = None;

    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((host, port)) {
            Ok(listener) => {
                if offset > 0 {
                    info!(base_port, port, "reload port in use; using the next free one");
                }
                return Ok(listener);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(SitepipeError::Other(anyhow::anyhow!(
        "failed to bind reload channel after {attempts} attempts from port {base_port}: {}",
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

fn listener_error(host: &str, port: u16, err: std::io::Error) -> SitepipeError {
    SitepipeError::Other(anyhow::Error::new(err).context(format!("reload channel on {host}:{port}")))
}
