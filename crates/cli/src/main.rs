// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! shq - ShakeQueue operator client
//!
//! Builds a single trigger document and writes it to a running daemon's
//! trigger port. One document per connection; the daemon closes after
//! reading.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shq_daemon::MAX_SIZE;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(
    name = "shq",
    version,
    about = "ShakeQueue - send earthquake triggers to a running shqd"
)]
struct Cli {
    /// Daemon host
    #[arg(long, global = true, default_value = "localhost")]
    host: String,

    /// Daemon trigger port
    #[arg(long, global = true, default_value_t = 2345)]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an origin trigger
    Origin {
        #[arg(long)]
        id: String,
        #[arg(long)]
        mag: f64,
        #[arg(long)]
        lon: f64,
        #[arg(long)]
        lat: f64,
        /// Origin time, e.g. 2024-01-01T00:00:00Z
        #[arg(long)]
        time: String,
        /// Comma-separated alternate ids
        #[arg(long)]
        alt: Option<String>,
        /// Action string recorded with the dispatch
        #[arg(long)]
        action: Option<String>,
    },
    /// Send a cancellation trigger
    Cancel {
        id: String,
    },
    /// Send a trigger of an arbitrary type
    Trigger {
        /// Trigger type, e.g. "Moment tensor"
        kind: String,
        id: String,
    },
    /// Send a raw JSON document from a file
    Send {
        file: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let document = match &cli.command {
        Commands::Origin {
            id,
            mag,
            lon,
            lat,
            time,
            alt,
            action,
        } => {
            let mut data = json!({
                "id": id,
                "mag": mag,
                "lon": lon,
                "lat": lat,
                "time": time,
            });
            if let Some(alt) = alt {
                data["alt_eventids"] = json!(alt);
            }
            if let Some(action) = action {
                data["action"] = json!(action);
            }
            serde_json::to_vec(&json!({ "type": "origin", "data": data }))?
        }
        Commands::Cancel { id } => {
            serde_json::to_vec(&json!({ "type": "cancel", "data": { "id": id } }))?
        }
        Commands::Trigger { kind, id } => {
            serde_json::to_vec(&json!({ "type": kind, "data": { "id": id } }))?
        }
        Commands::Send { file } => {
            let text = std::fs::read(file)
                .with_context(|| format!("could not read {}", file.display()))?;
            // Fail here rather than have the daemon log a malformed trigger.
            serde_json::from_slice::<serde_json::Value>(&text)
                .context("file is not valid JSON")?;
            text
        }
    };

    if document.len() > MAX_SIZE {
        bail!(
            "document is {} bytes; the daemon accepts at most {} bytes",
            document.len(),
            MAX_SIZE
        );
    }

    let addr = format!("{}:{}", cli.host, cli.port);
    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("could not connect to {addr}"))?;
    stream.write_all(&document).await?;
    stream.shutdown().await?;

    Ok(())
}
