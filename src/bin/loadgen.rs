//! loadgen — command line client for a stashd server.
//!
//! Speaks the same restricted HTTP/1.0 dialect as the server: one request
//! per connection, no keep-alive. Uploads read from and downloads land in a
//! local `Download/` directory.
//!
//! ```bash
//! loadgen get notes.txt
//! loadgen put notes.txt --host 10.0.0.5 --port 8080
//! loadgen get notes.txt --flood 1000
//! ```

use std::fs;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};

const DOWNLOAD_DIR: &str = "Download";

#[derive(Parser)]
#[command(name = "loadgen", about = "HTTP/1.0 client and flood tester for stashd", version)]
struct Cli {
    /// Request method
    #[arg(value_enum)]
    command: Command,

    /// File name on the server (and under Download/ locally)
    file: String,

    /// Server address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Repeat the request this many times with a short pause between,
    /// enough to trip the server's rate limiter
    #[arg(long)]
    flood: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Command {
    Get,
    Head,
    Post,
    Put,
}

impl Command {
    fn as_str(self) -> &'static str {
        match self {
            Command::Get => "GET",
            Command::Head => "HEAD",
            Command::Post => "POST",
            Command::Put => "PUT",
        }
    }

    fn sends_body(self) -> bool {
        matches!(self, Command::Post | Command::Put)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    let body = if cli.command.sends_body() {
        let local = Path::new(DOWNLOAD_DIR).join(&cli.file);
        if !local.is_file() {
            bail!("no local file to upload: {}", local.display());
        }
        fs::read(&local).with_context(|| format!("failed to read {}", local.display()))?
    } else {
        Vec::new()
    };

    match cli.flood {
        Some(count) => {
            for i in 0..count {
                let (status, _) = send_request(&addr, cli.command, &cli.file, &body)?;
                if i % 100 == 0 {
                    log::info!("request {} of {}: {}", i + 1, count, status);
                }
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        }
        None => {
            let (status, response_body) = send_request(&addr, cli.command, &cli.file, &body)?;
            println!("{}", status);

            if matches!(cli.command, Command::Get) && status.contains("200") {
                let target = save_download(&cli.file, &response_body)?;
                println!("saved {} byte(s) to {}", response_body.len(), target.display());
            }
            Ok(())
        }
    }
}

/// One request on a fresh connection; returns the status line and body.
fn send_request(
    addr: &str,
    command: Command,
    file: &str,
    body: &[u8],
) -> anyhow::Result<(String, Vec<u8>)> {
    let mut stream =
        TcpStream::connect(addr).with_context(|| format!("failed to connect to {}", addr))?;

    let mut request = format!("{} /{} HTTP/1.0\r\n", command.as_str(), file);
    if command.sends_body() {
        request.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    request.push_str("\r\n");

    stream.write_all(request.as_bytes())?;
    if command.sends_body() {
        stream.write_all(body)?;
    }
    stream.flush()?;

    // HTTP/1.0: the server closes the connection after one response.
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw)?;

    let header_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .context("malformed response: missing header terminator")?;
    let head = std::str::from_utf8(&raw[..header_end]).context("non-UTF-8 response headers")?;
    let status = head.lines().next().unwrap_or("").to_string();
    let response_body = raw[header_end + 4..].to_vec();

    Ok((status, response_body))
}

fn save_download(file: &str, body: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(DOWNLOAD_DIR)?;
    let target = Path::new(DOWNLOAD_DIR).join(file);
    fs::write(&target, body)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(target)
}
