//! TCP accept loop and per-connection pipeline
//!
//! The listener accepts connections and spawns one worker thread per
//! connection — unbounded on purpose: exercising the firewall requires that
//! a flood of connections all get through to the check. Sockets are blocking
//! with no timeout, so a stalled peer holds its worker; that too is a
//! documented property rather than something to silently fix here.
//!
//! Worker pipeline: ban check → frame → parse → visitor update → dispatch →
//! respond → close. Every failure is terminal for its connection and yields
//! exactly one response; nothing a single connection does can abort the
//! accept loop.

use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;

use super::firewall::{Firewall, FirewallConfig, Verdict};
use super::framing::read_request;
use super::handlers::{dispatch, resolve_target};
use super::request::{HttpMethod, HttpRequest};
use super::response::HttpResponse;
use super::{HttpError, HttpResult};
use crate::config::StashConfig;
use crate::visitors::VisitorRegistry;

/// Sent verbatim to banned clients, before any request bytes are parsed.
const BAN_NOTICE: &[u8] = b"HTTP/1.0 403 Forbidden\r\n\r\nIP banned due to excessive requests.";

/// The stashd HTTP server: a bound listener plus the shared state every
/// connection worker needs.
pub struct HttpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    firewall: Arc<Firewall>,
    visitors: Arc<VisitorRegistry>,
    upload_root: PathBuf,
    visitors_file: PathBuf,
    running: Arc<AtomicBool>,
}

impl HttpServer {
    /// Bind to the configured address.
    ///
    /// The visitor registry is taken by value: it was loaded from disk by the
    /// host and is owned by the server (and its shutdown handle) from here on.
    pub fn bind(config: &StashConfig, visitors: VisitorRegistry) -> HttpResult<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr)
            .map_err(|e| HttpError::ServerError(format!("failed to bind to {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| HttpError::ServerError(format!("failed to read local address: {}", e)))?;

        log::info!(
            "listening on {} (upload root {}, {} requests per {}s window)",
            local_addr,
            config.storage.upload_dir.display(),
            config.limits.max_requests,
            config.limits.window_secs
        );

        let firewall = Firewall::new(FirewallConfig {
            window: Duration::from_secs(config.limits.window_secs),
            max_requests: config.limits.max_requests,
        });

        Ok(Self {
            listener,
            local_addr,
            firewall: Arc::new(firewall),
            visitors: Arc::new(visitors),
            upload_root: config.storage.upload_dir.clone(),
            visitors_file: config.storage.visitors_file.clone(),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// The address this server is bound to (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shared handle to the visitor registry
    pub fn visitors(&self) -> Arc<VisitorRegistry> {
        Arc::clone(&self.visitors)
    }

    /// Handle for stopping the accept loop and flushing the visitor registry
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: Arc::clone(&self.running),
            local_addr: self.local_addr,
            visitors: Arc::clone(&self.visitors),
            visitors_file: self.visitors_file.clone(),
        }
    }

    /// Accept connections until shut down, one worker thread per connection.
    ///
    /// Blocks the calling thread. Accept errors are logged and never abort
    /// the loop.
    pub fn serve(&self) -> HttpResult<()> {
        for stream in self.listener.incoming() {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    let peer = match stream.peer_addr() {
                        Ok(peer) => peer,
                        Err(e) => {
                            log::warn!("dropping connection without peer address: {}", e);
                            continue;
                        }
                    };
                    log::debug!("connection from {}", peer);

                    let firewall = Arc::clone(&self.firewall);
                    let visitors = Arc::clone(&self.visitors);
                    let upload_root = self.upload_root.clone();
                    thread::spawn(move || {
                        if let Err(e) =
                            handle_connection(stream, peer, &firewall, &visitors, &upload_root)
                        {
                            log::error!("error handling connection from {}: {}", peer, e);
                        }
                    });
                }
                Err(e) => log::error!("failed to accept connection: {}", e),
            }
        }

        log::info!("accept loop stopped");
        Ok(())
    }
}

/// Shutdown hook for a running [`HttpServer`].
///
/// [`shutdown`](Self::shutdown) stops the accept loop, wakes the blocked
/// `accept` with a loopback connection, and flushes the visitor registry to
/// disk. In-flight connection workers are not drained.
#[derive(Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
    local_addr: SocketAddr,
    visitors: Arc<VisitorRegistry>,
    visitors_file: PathBuf,
}

impl ShutdownHandle {
    pub fn shutdown(&self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        // Wake the accept call; the loop re-checks the flag before handling.
        let _ = TcpStream::connect(self.local_addr);
        self.visitors.save(&self.visitors_file)?;
        log::info!("visitor registry saved to {}", self.visitors_file.display());
        Ok(())
    }
}

/// Handle a single client connection end-to-end
fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    firewall: &Firewall,
    visitors: &VisitorRegistry,
    upload_root: &Path,
) -> HttpResult<()> {
    let ip = peer.ip();

    if firewall.check(ip, Instant::now()) == Verdict::Banned {
        log::warn!("rejecting banned client {}", ip);
        stream
            .write_all(BAN_NOTICE)
            .map_err(|e| HttpError::ConnectionError(format!("failed to send ban notice: {}", e)))?;
        return Ok(());
    }

    let (response, is_head) = match read_framed_request(&mut stream) {
        Ok(request) => {
            let visit = visitors.record_visit(ip, Local::now());
            let target = resolve_target(upload_root, request.path());
            log::debug!("{} {} from {} (visit {})", request.method(), request.path(), ip, visit.count);
            let is_head = request.method() == HttpMethod::HEAD;
            (dispatch(request.method(), &target, request.body(), &visit), is_head)
        }
        Err(err) => {
            log::warn!("bad request from {}: {}", ip, err);
            (error_response(&err), false)
        }
    };

    let include_body = !is_head && response.status().is_success();
    stream
        .write_all(&response.to_bytes(include_body))
        .map_err(|e| HttpError::ConnectionError(format!("failed to write response: {}", e)))?;
    stream
        .flush()
        .map_err(|e| HttpError::ConnectionError(format!("failed to flush response: {}", e)))?;

    Ok(())
}

fn read_framed_request(stream: &mut TcpStream) -> HttpResult<HttpRequest> {
    let (header_block, body) = read_request(stream)?;
    HttpRequest::parse(&header_block, body)
}

/// Map a pipeline error to its HTTP status.
///
/// Framing and parse failures are the client's fault; everything else is an
/// internal error.
fn error_response(err: &HttpError) -> HttpResponse {
    match err {
        HttpError::InvalidRequest(_)
        | HttpError::UnsupportedMethod(_)
        | HttpError::InvalidPath(_)
        | HttpError::InvalidHeaders(_) => HttpResponse::bad_request(),
        HttpError::ConnectionError(_) | HttpError::ServerError(_) | HttpError::IoError(_) => {
            HttpResponse::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::StatusCode;

    #[test]
    fn parse_failures_map_to_400() {
        let err = HttpError::InvalidRequest("x".into());
        assert_eq!(error_response(&err).status(), StatusCode::BadRequest);
        let err = HttpError::UnsupportedMethod("DELETE".into());
        assert_eq!(error_response(&err).status(), StatusCode::BadRequest);
        let err = HttpError::InvalidPath("/../x".into());
        assert_eq!(error_response(&err).status(), StatusCode::BadRequest);
    }

    #[test]
    fn io_failures_map_to_500() {
        let err = HttpError::IoError("disk on fire".into());
        assert_eq!(error_response(&err).status(), StatusCode::InternalServerError);
    }

    #[test]
    fn ban_notice_is_a_complete_http_response() {
        let text = std::str::from_utf8(BAN_NOTICE).unwrap();
        assert!(text.starts_with("HTTP/1.0 403 Forbidden\r\n"));
        assert!(text.contains("\r\n\r\n"));
    }
}
