//! stashd — a minimal file-serving endpoint speaking a restricted subset of
//! HTTP/1.0 over raw TCP sockets.
//!
//! The server accepts one connection at a time per worker thread, frames and
//! parses the request from raw bytes, consults a per-IP firewall (sliding
//! request window plus a permanent ban set), records the visit, dispatches to
//! one of four method handlers (GET/HEAD/POST/PUT) rooted at a fixed upload
//! directory, and writes the response before closing the connection.
//!
//! # Architecture
//!
//! - [`http::server`] - TCP accept loop and per-connection pipeline
//! - [`http::framing`] - raw-byte request framing (header block + body)
//! - [`http::request`] - request parsing and representation
//! - [`http::response`] - response building and serialization
//! - [`http::firewall`] - request-rate tracking and permanent banning
//! - [`http::handlers`] - file-backed method handlers
//! - [`visitors`] - per-address visit bookkeeping, persisted as JSON
//! - [`config`] - configuration with env-var overrides

pub mod config;
pub mod http;
pub mod visitors;

pub use config::StashConfig;
pub use http::server::{HttpServer, ShutdownHandle};
pub use visitors::{VisitorRecord, VisitorRegistry};
