//! HTTP request parsing and representation
//!
//! A framed request (header block + body, see [`super::framing`]) is turned
//! into an [`HttpRequest`] here, or rejected with a typed error. Validation
//! covers the request-line shape, the protocol version, the method set, the
//! path (leading `/`, no `..` segments), header syntax, and the body length
//! against the declared Content-Length.

use std::collections::HashMap;
use std::str::FromStr;

use super::constants::{headers, HTTP_1_0};
use super::{HttpError, HttpResult};

/// HTTP methods supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    HEAD,
    POST,
    PUT,
}

impl HttpMethod {
    /// Convert method to string
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "HEAD" => Ok(HttpMethod::HEAD),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            _ => Err(HttpError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP version information. Only HTTP/1.0 is spoken here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http1_0,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        HTTP_1_0
    }
}

impl FromStr for HttpVersion {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            HTTP_1_0 => Ok(HttpVersion::Http1_0),
            _ => Err(HttpError::InvalidRequest(format!("unsupported HTTP version: {}", s))),
        }
    }
}

/// HTTP headers collection.
///
/// Keys are case-sensitive as received (trimmed); duplicates are
/// last-write-wins.
pub type Headers = HashMap<String, String>;

/// Represents a complete, validated HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    version: HttpVersion,
    headers: Headers,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Parse a framed request from its header block and body bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the request line is malformed, the version is not
    /// `HTTP/1.0`, the method is unsupported, the path is invalid or contains
    /// a `..` segment, a header line lacks a colon, or the body length does
    /// not match the declared Content-Length.
    pub fn parse(header_block: &[u8], body: Vec<u8>) -> HttpResult<Self> {
        let text = std::str::from_utf8(header_block).map_err(|e| {
            HttpError::InvalidRequest(format!("request headers are not valid UTF-8: {}", e))
        })?;

        let mut lines = text.split("\r\n");
        let request_line = lines.next().unwrap_or("");
        let (method, path, version) = Self::parse_request_line(request_line)?;
        Self::validate_path(&path)?;

        let headers = Self::parse_headers(lines)?;

        let declared = match headers.get(headers::CONTENT_LENGTH) {
            Some(value) => value.parse::<usize>().map_err(|e| {
                HttpError::InvalidHeaders(format!("invalid Content-Length: {}", e))
            })?,
            None => 0,
        };
        if body.len() != declared {
            return Err(HttpError::InvalidRequest(format!(
                "body length {} does not match Content-Length {}",
                body.len(),
                declared
            )));
        }

        Ok(Self { method, path, version, headers, body })
    }

    /// Parse the HTTP request line (e.g., "GET /path HTTP/1.0")
    fn parse_request_line(line: &str) -> HttpResult<(HttpMethod, String, HttpVersion)> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(HttpError::InvalidRequest(format!("invalid request line: {}", line)));
        }

        let method = parts[0].parse()?;
        let path = parts[1].to_string();
        let version = parts[2].parse()?;

        Ok((method, path, version))
    }

    /// Reject paths that do not start with `/` or that contain a `..`
    /// traversal segment. Checked on the raw path, before it is joined with
    /// the upload root.
    fn validate_path(path: &str) -> HttpResult<()> {
        if !path.starts_with('/') {
            return Err(HttpError::InvalidPath(format!("path must start with '/': {}", path)));
        }
        if path.split('/').any(|segment| segment == "..") {
            return Err(HttpError::InvalidPath(format!("path traversal rejected: {}", path)));
        }
        Ok(())
    }

    /// Parse HTTP header lines: split on the first colon, trim key and value
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> HttpResult<Headers> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.is_empty() {
                break;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| {
                HttpError::InvalidHeaders(format!("invalid header line: {}", line))
            })?;
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(headers)
    }

    // Accessors

    /// Get the HTTP method
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the HTTP version
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// Get all headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a specific header value (exact-case key)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Get the request body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
