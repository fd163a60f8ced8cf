//! satlink-node: run one end of a satlink from the terminal.
//!
//! Every stdin line is sent as one payload. Whatever arrives is printed, one
//! line per payload (hub) or per reassembled frame (satellite). EOF on stdin
//! shuts the link down.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use satlink::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "satlink-node")]
#[command(version = VERSION)]
#[command(about = "Hub or satellite end of a satlink, driven from stdin")]
struct Cli {
    /// JSON configuration document (`{"socket": {...}}`); defaults apply without one
    config: Option<PathBuf>,

    /// Override `socket.role`
    #[arg(long, value_enum)]
    role: Option<RoleArg>,

    /// Override the hub host (bind address, or the target for a satellite)
    #[arg(long)]
    host: Option<String>,

    /// Override the hub port
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Server,
    Client,
}

impl RoleArg {
    fn as_str(self) -> &'static str {
        match self {
            RoleArg::Server => "server",
            RoleArg::Client => "client",
        }
    }
}

/// Prints deliveries; satellites reassemble frames from raw chunks first.
struct Printer {
    decoder: Option<FrameDecoder>,
}

impl OutboundHandler for Printer {
    fn on_payload(&mut self, payload: bytes::Bytes) {
        let Some(decoder) = self.decoder.as_mut() else {
            println!("< {}", printable(&payload));
            return;
        };
        match decoder.feed(&payload) {
            Ok(frames) => {
                for frame in frames {
                    println!("< {}", printable(&frame));
                }
            }
            Err(e) => {
                log::warn!("discarding undecodable stream data: {e}");
                *decoder = FrameDecoder::new(FrameCodec::unbounded());
            }
        }
    }

    fn on_ready(&mut self) {
        // Fresh connection, fresh stream.
        self.decoder = Some(FrameDecoder::new(FrameCodec::unbounded()));
        println!("* ready");
    }
}

fn load(cli: &Cli) -> Result<TransportSettings> {
    let mut doc = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => serde_json::json!({}),
    };

    let socket = doc
        .as_object_mut()
        .context("configuration must be a JSON object")?
        .entry("socket")
        .or_insert_with(|| serde_json::json!({}))
        .as_object_mut()
        .context("`socket` must be a JSON object")?;
    if let Some(role) = cli.role {
        socket.insert("role".into(), role.as_str().into());
    }
    if cli.host.is_some() || cli.port.is_some() {
        let server = socket
            .entry("server")
            .or_insert_with(|| serde_json::json!({}))
            .as_object_mut()
            .context("`socket.server` must be a JSON object")?;
        if let Some(host) = &cli.host {
            server.insert("host".into(), host.as_str().into());
        }
        if let Some(port) = cli.port {
            server.insert("port".into(), port.into());
        }
    }

    Ok(TransportSettings::from_value(doc)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let settings = load(&cli)?;
    let role = settings.role();
    log::info!("starting {role} node");

    let link = Link::spawn(settings)?;
    let mut printer = Printer {
        decoder: (role == Role::Client).then(|| FrameDecoder::new(FrameCodec::unbounded())),
    };

    // Stdin blocks, so it gets its own thread and never holds the link.
    let (lines_tx, lines) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if lines_tx.send(line).is_err() {
                break;
            }
        }
    });

    while link.is_running() {
        match lines.try_recv() {
            Ok(line) => {
                if let Err(e) = link.send(line.into_bytes()) {
                    log::warn!("not sent: {e}");
                }
                continue;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }
        if link.wait(Duration::from_millis(50)) {
            link.dispatch(&mut printer);
        }
    }
    link.dispatch(&mut printer);

    let result = link.shutdown();
    if let Err(e) = &result {
        log::error!("transport ended: {e}");
    }
    result.map_err(Into::into)
}

/// Payload as text when it is UTF-8, escaped otherwise.
fn printable(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.escape_ascii().to_string(),
    }
}
