//! HTTP response building and serialization
//!
//! Headers are kept as an ordered list of name/value pairs rather than a map
//! so that repeated headers survive serialization; visit cookies go out as
//! two separate `Set-Cookie` lines.

use std::fmt::Write;

use super::constants::{headers, CRLF, HTTP_1_0};

/// The status codes this server emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    InternalServerError = 500,
}

impl StatusCode {
    /// Get the status code as a number
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the reason phrase for this status code
    pub fn reason_phrase(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Whether this status is in the 2xx class
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// HTTP response builder with fluent API
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new() }
    }

    /// Create a 200 OK response
    pub fn ok() -> Self {
        Self::new(StatusCode::Ok)
    }

    /// Create a 201 Created response
    pub fn created() -> Self {
        Self::new(StatusCode::Created)
    }

    /// Create a 400 Bad Request response
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BadRequest)
    }

    /// Create a 403 Forbidden response
    pub fn forbidden() -> Self {
        Self::new(StatusCode::Forbidden)
    }

    /// Create a 404 Not Found response
    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound)
    }

    /// Create a 500 Internal Server Error response
    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::InternalServerError)
    }

    // Builder methods

    /// Append a header (repeatable; order is preserved)
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a `Set-Cookie` header
    pub fn cookie(self, name: &str, value: &str) -> Self {
        let cookie = format!("{}={}", name, value);
        self.header(headers::SET_COOKIE, &cookie)
    }

    /// Set the body as raw bytes
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    // Accessors

    /// Get the status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get all headers, in insertion order
    pub fn get_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get the first value of a specific header
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Get the response body
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Convert the response to raw HTTP/1.0 bytes for transmission.
    ///
    /// The body is appended only when `include_body` is true; the caller
    /// decides based on the request method (HEAD never carries a body) and
    /// the status class (only 2xx responses do).
    pub fn to_bytes(&self, include_body: bool) -> Vec<u8> {
        let mut response = String::new();

        write!(&mut response, "{} {}{}", HTTP_1_0, self.status, CRLF)
            .expect("write to String is infallible");

        for (name, value) in &self.headers {
            write!(&mut response, "{}: {}{}", name, value, CRLF)
                .expect("write to String is infallible");
        }

        response.push_str(CRLF);

        let mut bytes = response.into_bytes();
        if include_body {
            bytes.extend_from_slice(&self.body);
        }

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::Created.to_string(), "201 Created");
        assert_eq!(StatusCode::Forbidden.to_string(), "403 Forbidden");
        assert_eq!(StatusCode::InternalServerError.to_string(), "500 Internal Server Error");
    }

    #[test]
    fn success_class() {
        assert!(StatusCode::Ok.is_success());
        assert!(StatusCode::Created.is_success());
        assert!(!StatusCode::BadRequest.is_success());
        assert!(!StatusCode::NotFound.is_success());
    }

    #[test]
    fn serializes_status_line_headers_and_body() {
        let response = HttpResponse::ok()
            .header("Content-Type", "text/plain")
            .header("Content-Length", "5")
            .body(b"hello".to_vec());

        let bytes = response.to_bytes(true);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn body_is_suppressed_when_requested() {
        let response = HttpResponse::ok().body(b"hello".to_vec());
        let bytes = response.to_bytes(false);
        assert!(String::from_utf8(bytes).unwrap().ends_with("\r\n\r\n"));
    }

    #[test]
    fn repeated_cookies_survive_in_order() {
        let response = HttpResponse::created().cookie("visit_count", "3").cookie("last_visit", "t");
        let text = String::from_utf8(response.to_bytes(true)).unwrap();
        let first = text.find("Set-Cookie: visit_count=3").unwrap();
        let second = text.find("Set-Cookie: last_visit=t").unwrap();
        assert!(first < second);
    }

    #[test]
    fn error_responses_have_bare_header_block() {
        let bytes = HttpResponse::bad_request().to_bytes(false);
        assert_eq!(bytes, b"HTTP/1.0 400 Bad Request\r\n\r\n");
    }
}
