//! stashd — HTTP/1.0 file store daemon.
//!
//! Serves and accepts files under an upload directory over plain HTTP/1.0,
//! rate limits clients per IP, and keeps a visitor ledger across restarts.
//!
//! ```bash
//! stashd 8080 --upload-dir Upload
//! ```
//!
//! See `stashd --help` for all options. Every flag also has an `SD_*`
//! environment variable; flags win.

use std::fs;
use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use clap::Parser;

use stashd::config::StashConfig;
use stashd::http::HttpServer;
use stashd::visitors::VisitorRegistry;

#[derive(Parser)]
#[command(name = "stashd", about = "HTTP/1.0 file store with per-IP rate limiting", version)]
struct Cli {
    /// Port to listen on
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Directory served and written by the endpoint
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Visitor ledger file
    #[arg(long)]
    visitors_file: Option<PathBuf>,

    /// Rate limit window in seconds
    #[arg(long)]
    rate_window: Option<u64>,

    /// Requests allowed per window before a permanent ban
    #[arg(long)]
    rate_limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = StashConfig::default();
    config.apply_env_vars();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(dir) = cli.upload_dir {
        config.storage.upload_dir = dir;
    }
    if let Some(file) = cli.visitors_file {
        config.storage.visitors_file = file;
    }
    if let Some(window) = cli.rate_window {
        config.limits.window_secs = window;
    }
    if let Some(limit) = cli.rate_limit {
        config.limits.max_requests = limit;
    }
    config.validate()?;

    fs::create_dir_all(&config.storage.upload_dir).with_context(|| {
        format!("failed to create upload directory {}", config.storage.upload_dir.display())
    })?;

    let visitors = VisitorRegistry::load(&config.storage.visitors_file)?;
    let server = HttpServer::bind(&config, visitors)
        .map_err(|e| anyhow::anyhow!("failed to start server: {}", e))?;

    let handle = server.shutdown_handle();
    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
            .expect("failed to build signal runtime");
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("received Ctrl-C, shutting down");
                if let Err(e) = handle.shutdown() {
                    log::error!("shutdown failed: {}", e);
                }
            }
        });
    });

    server.serve().map_err(|e| anyhow::anyhow!("server error: {}", e))?;
    Ok(())
}
