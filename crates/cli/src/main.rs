// ABOUTME: CLI for decoding OPDS catalog feeds with opds-feed.
// ABOUTME: Fetches a feed from URL or file/stdin, classifies it, and prints JSON for inspection.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use opds_feed::{parse_feed_bytes_with, Client, DecodeMode, Feed};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Decode one or more OPDS 1.x feeds and output JSON.
#[derive(Parser, Debug)]
#[command(name = "opds-cli")]
#[command(about = "Decode OPDS catalog feeds and print JSON", long_about = None)]
struct Args {
    /// Feed URL(s) (http/https) or local file paths. Use "-" to read one feed from stdin.
    #[arg(required = true)]
    targets: Vec<String>,

    /// Fail on malformed XML instead of returning a partial feed.
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Extract Calibre metadata (RATING, TAGS, SERIES) into each entry's app_meta.
    #[arg(long, default_value_t = false)]
    calibre: bool,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mode = if args.strict {
        DecodeMode::Strict
    } else {
        DecodeMode::Lenient
    };
    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .decode_mode(mode)
        .build()?;

    let mut results = Vec::new();
    for target in &args.targets {
        match load_feed(&client, target, mode) {
            Ok(mut feed) => {
                if args.calibre {
                    feed.parse_calibre_metadata();
                }
                results.push(json!({
                    "source": target,
                    "ok": true,
                    "kind": feed.kind(),
                    "feed": feed,
                    "error": null
                }));
            }
            Err(err) => {
                tracing::warn!(target = %target, error = %err, "failed to load feed");
                results.push(json!({
                    "source": target,
                    "ok": false,
                    "kind": null,
                    "feed": null,
                    "error": err.to_string()
                }));
            }
        }
    }

    let output = render(results);
    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

/// A single successful target prints bare; anything else gets an envelope with counts.
fn render(results: Vec<Value>) -> Value {
    let parsed = results
        .iter()
        .filter(|r| r.get("ok").and_then(Value::as_bool) == Some(true))
        .count();

    if results.len() == 1 && parsed == 1 {
        return results.into_iter().next().unwrap_or_else(|| json!({}));
    }

    let failed = results.len() - parsed;
    json!({
        "feeds": results,
        "total_feeds": results.len(),
        "parsed": parsed,
        "failed": failed
    })
}

fn load_feed(client: &Client, target: &str, mode: DecodeMode) -> Result<Feed> {
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(client.fetch(target)?);
    }

    let bytes = if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        let path = PathBuf::from(target);
        if !path.exists() {
            return Err(anyhow!("file not found: {}", target));
        }
        fs::read(path)?
    };
    Ok(parse_feed_bytes_with(&bytes, mode)?)
}
