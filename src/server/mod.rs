// src/server/mod.rs

//! Development HTTP server for the build tree.
//!
//! Serves files with `tiny_http` on a dedicated thread. HTML responses get
//! the live-reload client injected; the reload channel itself lives in
//! [`reload`].

pub mod mime;
pub mod reload;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

use crate::errors::{Result, SitepipeError};

pub use reload::{ReloadHub, ReloadMessage};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

const LIVERELOAD_JS: &str = include_str!("livereload.js");
const PORT_PLACEHOLDER: &str = "__SITEPIPE_RELOAD_PORT__";

/// What the request handler needs to know.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Directory served at `/`.
    pub root: PathBuf,
    /// Send `Access-Control-Allow-Origin: *` and answer preflights.
    pub cors: bool,
    /// Port of the reload channel; `None` disables script injection.
    pub reload_port: Option<u16>,
}

/// A running HTTP listener. Dropping it stops the request loop.
pub struct DevServer {
    server: Arc<Server>,
    addr: SocketAddr,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for DevServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServer").field("addr", &self.addr).finish()
    }
}

impl DevServer {
    /// Bind on `host:port` (retrying successive ports while they are taken)
    /// and start serving `options.root`.
    pub fn start(host: &str, port: u16, options: ServeOptions) -> Result<Self> {
        let (server, addr) = bind_with_retry(host, port)?;
        let server = Arc::new(server);

        let loop_server = Arc::clone(&server);
        let thread = thread::Builder::new()
            .name("sitepipe-http".to_string())
            .spawn(move || run_request_loop(&loop_server, &options))
            .map_err(|e| SitepipeError::Other(anyhow::Error::new(e).context("spawning http thread")))?;

        info!("serving on http://{addr}");
        Ok(Self {
            server,
            addr,
            thread: Some(thread),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and wait for the request thread.
    pub fn shutdown(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
            debug!(addr = %self.addr, "http server stopped");
        }
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn bind_with_retry(host: &str, base_port: u16) -> Result<(Server, SocketAddr)> {
    let ip: std::net::IpAddr = host
        .parse()
        .map_err(|e| SitepipeError::ConfigError(format!("invalid server host {host:?}: {e}")))?;
    let attempts = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };

    let mut last_error = String::new();
    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(ip, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(ip, port));
                if offset > 0 {
                    info!(base_port, port, "port in use; using the next free one");
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(SitepipeError::Other(anyhow::anyhow!(
        "failed to bind http server after {attempts} attempts from port {base_port}: {last_error}"
    )))
}

fn run_request_loop(server: &Server, options: &ServeOptions) {
    for request in server.incoming_requests() {
        let url = request.url().to_string();
        if let Err(err) = handle_request(request, options) {
            warn!(%url, error = %err, "request failed");
        }
    }
}

fn handle_request(request: Request, options: &ServeOptions) -> std::io::Result<()> {
    let method = request.method().clone();
    debug!(%method, url = request.url(), "request");

    match method {
        Method::Options => {
            let response = with_common_headers(Response::from_data(Vec::new()), None, options)
                .with_status_code(StatusCode(204));
            request.respond(response)
        }
        Method::Get | Method::Head => match resolve_path(request.url(), &options.root) {
            Some(path) => respond_file(request, &path, options),
            None => respond_status(request, 404, b"404 Not Found", options),
        },
        _ => respond_status(request, 405, b"405 Method Not Allowed", options),
    }
}

fn respond_file(request: Request, path: &Path, options: &ServeOptions) -> std::io::Result<()> {
    let content_type = mime::from_path(path);
    let body = fs::read(path)?;
    let body = match options.reload_port {
        Some(port) if content_type == mime::types::HTML => inject_reload_script(&body, port),
        _ => body,
    };

    // tiny_http drops the body for HEAD requests itself.
    let response = with_common_headers(Response::from_data(body), Some(content_type), options);
    request.respond(response)
}

fn respond_status(
    request: Request,
    status: u16,
    body: &[u8],
    options: &ServeOptions,
) -> std::io::Result<()> {
    let response = with_common_headers(
        Response::from_data(body.to_vec()),
        Some(mime::types::PLAIN),
        options,
    )
    .with_status_code(StatusCode(status));
    request.respond(response)
}

fn with_common_headers<R: std::io::Read>(
    mut response: Response<R>,
    content_type: Option<&str>,
    options: &ServeOptions,
) -> Response<R> {
    if let Some(ct) = content_type.and_then(|ct| header("Content-Type", ct)) {
        response.add_header(ct);
    }
    // Dev builds change under the browser's feet.
    if let Some(h) = header("Cache-Control", "no-store") {
        response.add_header(h);
    }
    if options.cors {
        for (name, value) in [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS"),
            ("Access-Control-Allow-Headers", "*"),
        ] {
            if let Some(h) = header(name, value) {
                response.add_header(h);
            }
        }
    }
    response
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

/// Map a request URL to a file under `root`.
///
/// Directories resolve to their `index.html`. Anything escaping `root`
/// (`..`, symlinks) resolves to nothing.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;
    if clean.split('/').any(|seg| seg == "..") {
        return None;
    }

    let canonical = root.join(&clean).canonicalize().ok()?;
    let root_canonical = root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }
    None
}

/// Decode, drop query and fragment, trim slashes. `None` when the path
/// does not decode to UTF-8.
fn normalize_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_encoding::percent_decode_str(path).decode_utf8().ok()?;
    Some(decoded.replace('\\', "/").trim_matches('/').to_string())
}

/// The live-reload client as an inline `<script>` tag.
pub fn reload_script_tag(port: u16) -> String {
    format!(
        "<script>{}</script>",
        LIVERELOAD_JS.replace(PORT_PLACEHOLDER, &port.to_string())
    )
}

/// Insert the reload client before the last `</body>`, or append it when
/// there is none.
pub fn inject_reload_script(content: &[u8], port: u16) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";
    let script = reload_script_tag(port);
    let script = script.as_bytes();

    let mut out = Vec::with_capacity(content.len() + script.len());
    match content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            out.extend_from_slice(&content[..pos]);
            out.extend_from_slice(script);
            out.extend_from_slice(&content[pos..]);
        }
        None => {
            out.extend_from_slice(content);
            out.extend_from_slice(script);
        }
    }
    out
}
