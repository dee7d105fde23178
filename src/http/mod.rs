//! HTTP/1.0 server implementation over raw `std::net` sockets
//!
//! This module implements the restricted HTTP/1.0 dialect stashd speaks:
//! no keep-alive, no chunked transfer, no pipelining. One request per
//! connection, read with blocking I/O, answered, closed.
//!
//! # Architecture
//!
//! - [`server`] - accept loop and per-connection worker pipeline
//! - [`framing`] - byte-boundary detection for one complete request
//! - [`request`] - request parsing and representation
//! - [`response`] - response building and serialization
//! - [`firewall`] - per-IP rate window and permanent ban set
//! - [`handlers`] - GET/HEAD/POST/PUT against the upload root

pub mod firewall;
pub mod framing;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use firewall::{Firewall, FirewallConfig, Verdict};
pub use request::{HttpMethod, HttpRequest, HttpVersion};
pub use response::{HttpResponse, StatusCode};
pub use server::{HttpServer, ShutdownHandle};

/// Result type for HTTP operations
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// HTTP-specific error types
#[derive(Debug, Clone)]
pub enum HttpError {
    /// Invalid HTTP request format (bad request line, framing failure,
    /// body shorter than its declared Content-Length)
    InvalidRequest(String),
    /// Unsupported HTTP method
    UnsupportedMethod(String),
    /// Path does not start with `/` or contains a traversal segment
    InvalidPath(String),
    /// Invalid HTTP headers
    InvalidHeaders(String),
    /// Connection-related errors
    ConnectionError(String),
    /// Server binding or startup errors
    ServerError(String),
    /// Generic I/O errors
    IoError(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::InvalidRequest(msg) => write!(f, "Invalid HTTP request: {}", msg),
            HttpError::UnsupportedMethod(method) => {
                write!(f, "Unsupported HTTP method: {}", method)
            }
            HttpError::InvalidPath(msg) => write!(f, "Invalid path: {}", msg),
            HttpError::InvalidHeaders(msg) => write!(f, "Invalid headers: {}", msg),
            HttpError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            HttpError::ServerError(msg) => write!(f, "Server error: {}", msg),
            HttpError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::IoError(err.to_string())
    }
}

/// HTTP/1.0 protocol constants
pub mod constants {
    /// The one and only version string this server accepts
    pub const HTTP_1_0: &str = "HTTP/1.0";

    /// Common HTTP headers
    pub mod headers {
        pub const CONTENT_TYPE: &str = "Content-Type";
        pub const CONTENT_LENGTH: &str = "Content-Length";
        pub const SET_COOKIE: &str = "Set-Cookie";
    }

    /// HTTP line ending
    pub const CRLF: &str = "\r\n";
    pub const DOUBLE_CRLF_BYTES: &[u8] = b"\r\n\r\n";
}
