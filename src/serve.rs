//! Live server for the build artifact.
//!
//! A lightweight HTTP server on `tiny_http` that serves exactly one file:
//!
//! - `/`, `/index.html` and `/<artifact name>` → the artifact, read from
//!   disk on every request, with `Last-Modified` and `Cache-Control: no-cache`
//! - anything else, or an artifact that does not exist yet → 404
//!
//! The page's poller sends `HEAD` requests and reloads when
//! `Last-Modified` changes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │   Watch Thread   │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │ read                  │ write (temp + rename)
//!          ▼                       ▼
//!         dist/<name>.html  ◀──────┘
//! ```

use crate::log;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use std::{
    fs::File,
    io::{Cursor, Read},
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// HTTP-date format (RFC 7231, always GMT)
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

// ============================================================================
// Server
// ============================================================================

/// HTTP server bound to one artifact path.
pub struct LiveServer {
    server: Arc<Server>,
    addr: SocketAddr,
    artifact: PathBuf,
}

impl LiveServer {
    /// Bind to `interface:port`, trying the following ports if it is taken.
    pub fn bind(interface: IpAddr, port: u16, artifact: PathBuf) -> Result<Self> {
        let (server, addr) = try_bind_port(interface, port, MAX_PORT_RETRIES)?;
        Ok(Self {
            server: Arc::new(server),
            addr,
            artifact,
        })
    }

    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle used to stop [`LiveServer::run`] from another thread.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle(Arc::clone(&self.server))
    }

    /// Handle requests until unblocked.
    pub fn run(&self) {
        for request in self.server.incoming_requests() {
            if let Err(e) = handle_request(request, &self.artifact) {
                log!("serve"; "request error: {e}");
            }
        }
    }
}

/// Cloneable handle that stops a running [`LiveServer`].
#[derive(Clone)]
pub struct ServerHandle(Arc<Server>);

impl ServerHandle {
    pub fn unblock(&self) {
        self.0.unblock();
    }
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
///
/// Port `0` asks the OS for a free port.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
fn handle_request(request: Request, artifact: &Path) -> Result<()> {
    let is_read = matches!(request.method(), Method::Get | Method::Head);
    let name = artifact.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    if is_read && resolves_to_artifact(request.url(), name) {
        serve_artifact(request, artifact)
    } else {
        serve_not_found(request)
    }
}

/// Whether a request URL names the artifact.
fn resolves_to_artifact(url: &str, artifact_name: &str) -> bool {
    // Strip query string (e.g., ?t=123456) before decoding
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = urlencoding::decode(path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    match path.trim_start_matches('/') {
        "" | "index.html" => true,
        requested => requested == artifact_name,
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow!("invalid header `{name}: {value}`"))
}

/// Format a modification time as an HTTP-date.
fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE).to_string()
}

/// Serve the artifact as it is on disk right now.
///
/// Content and timestamp come from the same open handle, so a rename that
/// lands mid-request cannot pair new content with an old timestamp.
fn serve_artifact(request: Request, path: &Path) -> Result<()> {
    let Ok(mut file) = File::open(path) else {
        return serve_not_found(request);
    };

    let mut content = Vec::new();
    let modified = file
        .read_to_end(&mut content)
        .and_then(|_| file.metadata())
        .and_then(|meta| meta.modified());
    let Ok(modified) = modified else {
        return serve_not_found(request);
    };

    let response = Response::from_data(content)
        .with_header(header("Content-Type", "text/html; charset=utf-8")?)
        .with_header(header("Last-Modified", &http_date(modified))?)
        .with_header(header("Cache-Control", "no-cache")?);

    request
        .respond(response)
        .with_context(|| format!("Failed to send {}", path.display()))
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![header("Content-Type", "text/plain")?],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}
