//! Raw-byte request framing
//!
//! Reads bytes off a connection in 4 KiB chunks until the `\r\n\r\n` header
//! terminator is observed, then continues reading until the declared
//! Content-Length of body bytes is buffered. Returns the raw bytes
//! partitioned into header block and body; structural validation happens in
//! [`super::request`].
//!
//! There is deliberately no maximum header/body size and no read timeout: a
//! slow or adversarial peer holds its worker thread indefinitely. Production
//! hardening would cap both; the integration tests pin down the behavior as
//! it stands.

use std::io::Read;

use super::constants::DOUBLE_CRLF_BYTES;
use super::{HttpError, HttpResult};

const READ_CHUNK: usize = 4096;

/// Read one complete request off `stream`.
///
/// Returns `(header_block, body)`. The header block excludes the terminating
/// blank line. The body is truncated to the declared Content-Length (excess
/// bytes that arrived in the same chunk as the headers are dropped); if the
/// peer closes early the body is returned short and the parser reports the
/// mismatch. A close before the header terminator is a framing failure.
pub fn read_request<R: Read>(stream: &mut R) -> HttpResult<(Vec<u8>, Vec<u8>)> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
        let n = stream
            .read(&mut chunk)
            .map_err(|e| HttpError::ConnectionError(format!("failed to read request: {}", e)))?;
        if n == 0 {
            return Err(HttpError::InvalidRequest(
                "connection closed before end of headers".to_string(),
            ));
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let mut body = buffer.split_off(header_end + DOUBLE_CRLF_BYTES.len());
    buffer.truncate(header_end);

    let declared = declared_content_length(&buffer)?;
    while body.len() < declared {
        // Never read past the declared body length.
        let want = (declared - body.len()).min(READ_CHUNK);
        let n = stream
            .read(&mut chunk[..want])
            .map_err(|e| HttpError::ConnectionError(format!("failed to read body: {}", e)))?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(declared);

    Ok((buffer, body))
}

/// Position of the first `\r\n\r\n` in `buffer`, if complete headers arrived
fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(DOUBLE_CRLF_BYTES.len()).position(|window| window == DOUBLE_CRLF_BYTES)
}

/// Extract the declared Content-Length from a raw header block.
///
/// Exact-case key match, last occurrence wins, absent means 0.
fn declared_content_length(header_block: &[u8]) -> HttpResult<usize> {
    let text = String::from_utf8_lossy(header_block);
    let mut declared = 0;
    for line in text.split("\r\n").skip(1) {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim() == "Content-Length" {
                declared = value.trim().parse::<usize>().map_err(|e| {
                    HttpError::InvalidHeaders(format!("invalid Content-Length: {}", e))
                })?;
            }
        }
    }
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Delivers the wrapped bytes a few at a time, like a slow peer.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let end = (self.pos + self.step).min(self.data.len());
            let n = (end - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn frames_headers_and_body() {
        let raw = b"PUT /a.txt HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello";
        let (headers, body) = read_request(&mut Cursor::new(raw.to_vec())).unwrap();
        assert_eq!(headers, b"PUT /a.txt HTTP/1.0\r\nContent-Length: 5");
        assert_eq!(body, b"hello");
    }

    #[test]
    fn frames_request_without_body() {
        let raw = b"GET /a.txt HTTP/1.0\r\nHost: x\r\n\r\n";
        let (headers, body) = read_request(&mut Cursor::new(raw.to_vec())).unwrap();
        assert_eq!(headers, b"GET /a.txt HTTP/1.0\r\nHost: x");
        assert!(body.is_empty());
    }

    #[test]
    fn assembles_body_split_across_reads() {
        let raw = b"PUT /a HTTP/1.0\r\nContent-Length: 12\r\n\r\nhello world!".to_vec();
        let mut stream = Trickle { data: raw, pos: 0, step: 3 };
        let (_, body) = read_request(&mut stream).unwrap();
        assert_eq!(body, b"hello world!");
    }

    #[test]
    fn eof_before_headers_is_a_framing_failure() {
        let raw = b"GET / HTTP/1.0\r\nHost: x\r\n";
        let err = read_request(&mut Cursor::new(raw.to_vec())).unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
    }

    #[test]
    fn short_body_is_returned_as_read() {
        // The parser, not the framer, reports the length mismatch.
        let raw = b"PUT /a HTTP/1.0\r\nContent-Length: 100\r\n\r\nonly-this";
        let (_, body) = read_request(&mut Cursor::new(raw.to_vec())).unwrap();
        assert_eq!(body, b"only-this");
    }

    #[test]
    fn excess_bytes_beyond_content_length_are_dropped() {
        let raw = b"PUT /a HTTP/1.0\r\nContent-Length: 5\r\n\r\nhelloTRAILING";
        let (_, body) = read_request(&mut Cursor::new(raw.to_vec())).unwrap();
        assert_eq!(body, b"hello");
    }

    #[test]
    fn invalid_content_length_is_rejected_at_framing() {
        let raw = b"PUT /a HTTP/1.0\r\nContent-Length: nope\r\n\r\n";
        let err = read_request(&mut Cursor::new(raw.to_vec())).unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeaders(_)));
    }
}
