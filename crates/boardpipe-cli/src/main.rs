//! Boardpipe CLI - board item normalization tool

use anyhow::{Context, Result};
use boardpipe::prelude::*;
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boardpipe")]
#[command(
    author,
    version,
    about = "Normalize board item payloads into typed column values"
)]
struct Cli {
    /// Input JSON file with one item or a list of items (default: stdin)
    input: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pipeable JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let payload = read_payload(cli.input.as_ref())?;
    let items = parse_items(&payload).context("Failed to parse input items")?;
    tracing::debug!("Normalizing {} item(s)", items.len());

    // One normalized column list per input item
    let normalized: Vec<Vec<NormalizedColumn>> = items.iter().map(normalize).collect();

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&normalized)?
    } else {
        serde_json::to_string(&normalized)?
    };

    let mut stdout = io::stdout();
    stdout
        .write_all(rendered.as_bytes())
        .context("Failed to write to stdout")?;
    stdout
        .write_all(b"\n")
        .context("Failed to write to stdout")?;

    Ok(())
}

fn read_payload(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
