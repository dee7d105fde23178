//! File-backed method handlers
//!
//! Each handler works against a resolved target path under the upload root
//! and returns a complete [`HttpResponse`]; expected failures (missing file,
//! POST conflict, permission denied) are responses, never panics or bubbled
//! errors. Successful 2xx responses carry the visit bookkeeping as two
//! `Set-Cookie` headers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::constants::headers;
use super::request::HttpMethod;
use super::response::HttpResponse;
use crate::visitors::VisitorRecord;

/// Join the upload root with a validated request path.
///
/// Traversal segments were already rejected at parse time, so stripping the
/// leading `/` and joining cannot escape the root.
pub fn resolve_target(upload_root: &Path, request_path: &str) -> PathBuf {
    upload_root.join(request_path.trim_start_matches('/'))
}

/// Route a parsed request to its method handler
pub fn dispatch(
    method: HttpMethod,
    target: &Path,
    body: &[u8],
    visit: &VisitorRecord,
) -> HttpResponse {
    match method {
        HttpMethod::GET => handle_get(target, visit),
        HttpMethod::HEAD => handle_head(target, visit),
        HttpMethod::POST => handle_post(target, body, visit),
        HttpMethod::PUT => handle_put(target, body, visit),
    }
}

fn handle_get(target: &Path, visit: &VisitorRecord) -> HttpResponse {
    if !target.is_file() {
        return HttpResponse::not_found();
    }
    let contents = match fs::read(target) {
        Ok(contents) => contents,
        Err(e) => return io_error_response(&e, target),
    };
    let mime = mime_guess::from_path(target).first_or_octet_stream();
    with_visit_cookies(
        HttpResponse::ok()
            .header(headers::CONTENT_TYPE, mime.as_ref())
            .header(headers::CONTENT_LENGTH, &contents.len().to_string()),
        visit,
    )
    .body(contents)
}

/// Same existence and metadata logic as GET, but the file contents are never
/// read; Content-Length comes from the file size.
fn handle_head(target: &Path, visit: &VisitorRecord) -> HttpResponse {
    if !target.is_file() {
        return HttpResponse::not_found();
    }
    let size = match fs::metadata(target) {
        Ok(meta) => meta.len(),
        Err(e) => return io_error_response(&e, target),
    };
    let mime = mime_guess::from_path(target).first_or_octet_stream();
    with_visit_cookies(
        HttpResponse::ok()
            .header(headers::CONTENT_TYPE, mime.as_ref())
            .header(headers::CONTENT_LENGTH, &size.to_string()),
        visit,
    )
}

/// POST never overwrites: an existing target is a conflict.
fn handle_post(target: &Path, body: &[u8], visit: &VisitorRecord) -> HttpResponse {
    if target.exists() {
        log::debug!("POST conflict, {} already exists", target.display());
        return HttpResponse::forbidden();
    }
    match write_file(target, body) {
        Ok(()) => with_visit_cookies(HttpResponse::created(), visit),
        Err(e) => io_error_response(&e, target),
    }
}

/// PUT creates or overwrites; the status tells which happened.
fn handle_put(target: &Path, body: &[u8], visit: &VisitorRecord) -> HttpResponse {
    let existed = target.exists();
    match write_file(target, body) {
        Ok(()) => {
            let response = if existed { HttpResponse::ok() } else { HttpResponse::created() };
            with_visit_cookies(response, visit)
        }
        Err(e) => io_error_response(&e, target),
    }
}

fn write_file(target: &Path, body: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, body)
}

fn with_visit_cookies(response: HttpResponse, visit: &VisitorRecord) -> HttpResponse {
    response
        .cookie("visit_count", &visit.count.to_string())
        .cookie("last_visit", &visit.last_visit)
}

fn io_error_response(err: &io::Error, target: &Path) -> HttpResponse {
    if err.kind() == io::ErrorKind::PermissionDenied {
        log::warn!("permission denied for {}: {}", target.display(), err);
        HttpResponse::forbidden()
    } else {
        log::error!("file operation failed for {}: {}", target.display(), err);
        HttpResponse::internal_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::StatusCode;

    fn visit() -> VisitorRecord {
        VisitorRecord { count: 7, last_visit: "2026-08-28T10:00:00+00:00".to_string() }
    }

    fn cookies(response: &HttpResponse) -> Vec<&str> {
        response
            .get_headers()
            .iter()
            .filter(|(n, _)| n == "Set-Cookie")
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn get_missing_file_is_404_without_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let response = dispatch(HttpMethod::GET, &dir.path().join("nope.txt"), b"", &visit());
        assert_eq!(response.status(), StatusCode::NotFound);
        assert!(response.get_headers().is_empty());
        assert!(response.body_bytes().is_empty());
    }

    #[test]
    fn get_serves_contents_with_mime_and_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.txt");
        fs::write(&target, b"hello").unwrap();

        let response = dispatch(HttpMethod::GET, &target, b"", &visit());
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header_value("Content-Type"), Some("text/plain"));
        assert_eq!(response.header_value("Content-Length"), Some("5"));
        assert_eq!(response.body_bytes(), b"hello");
        assert_eq!(
            cookies(&response),
            vec!["visit_count=7", "last_visit=2026-08-28T10:00:00+00:00"]
        );
    }

    #[test]
    fn get_unknown_extension_defaults_to_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("blob.zzz");
        fs::write(&target, b"\x00\x01").unwrap();

        let response = dispatch(HttpMethod::GET, &target, b"", &visit());
        assert_eq!(response.header_value("Content-Type"), Some("application/octet-stream"));
    }

    #[test]
    fn head_reports_size_with_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.txt");
        fs::write(&target, b"abcdef").unwrap();

        let response = dispatch(HttpMethod::HEAD, &target, b"", &visit());
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header_value("Content-Length"), Some("6"));
        assert!(response.body_bytes().is_empty());
    }

    #[test]
    fn head_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = dispatch(HttpMethod::HEAD, &dir.path().join("nope"), b"", &visit());
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn post_creates_then_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.txt");

        let first = dispatch(HttpMethod::POST, &target, b"hello", &visit());
        assert_eq!(first.status(), StatusCode::Created);
        assert_eq!(fs::read(&target).unwrap(), b"hello");

        let second = dispatch(HttpMethod::POST, &target, b"other", &visit());
        assert_eq!(second.status(), StatusCode::Forbidden);
        assert_eq!(fs::read(&target).unwrap(), b"hello");
    }

    #[test]
    fn put_distinguishes_create_from_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.txt");

        let first = dispatch(HttpMethod::PUT, &target, b"hello", &visit());
        assert_eq!(first.status(), StatusCode::Created);

        let second = dispatch(HttpMethod::PUT, &target, b"world", &visit());
        assert_eq!(second.status(), StatusCode::Ok);
        assert_eq!(fs::read(&target).unwrap(), b"world");
    }

    #[test]
    fn writes_create_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deep/report.txt");

        let response = dispatch(HttpMethod::PUT, &target, b"x", &visit());
        assert_eq!(response.status(), StatusCode::Created);
        assert_eq!(fs::read(&target).unwrap(), b"x");
    }

    #[test]
    fn resolve_target_joins_under_the_root() {
        let root = Path::new("/srv/upload");
        assert_eq!(resolve_target(root, "/report.txt"), Path::new("/srv/upload/report.txt"));
        assert_eq!(resolve_target(root, "/a/b.txt"), Path::new("/srv/upload/a/b.txt"));
    }
}
