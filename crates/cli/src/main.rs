// ABOUTME: CLI for parsing podcast feeds and OPML lists with podsift-feed.
// ABOUTME: Loads documents from URLs, files or stdin, checks their format and prints JSON.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use podsift_feed::{
    load_with_options, supports_content_type, try_magic, FeedDocument, ParseOptions, ParseOutcome,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Parse podcast RSS feeds or OPML subscription lists and output JSON.
#[derive(Parser, Debug)]
#[command(name = "podsift")]
#[command(about = "Parse podcast feeds and OPML files and print JSON", long_about = None)]
struct Args {
    /// Feed URL(s) (http/https) or local file paths. Use "-" to read one document from stdin.
    #[arg(required = true)]
    targets: Vec<String>,

    /// Override the origin URL stamped on the result (only valid with a single target).
    #[arg(long)]
    origin_url: Option<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Keep a lone top-level OPML folder instead of collapsing it into the root.
    #[arg(long, default_value_t = false)]
    no_collapse: bool,

    /// Deepest OPML folder nesting to accept.
    #[arg(long)]
    max_depth: Option<usize>,
}

/// Raw document plus the content type declared by the transport, if any.
struct Fetched {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.targets.len() > 1 && args.origin_url.is_some() {
        bail!("--origin-url is only valid when parsing a single target");
    }

    let mut options = ParseOptions::default().collapse_single_container(!args.no_collapse);
    if let Some(depth) = args.max_depth {
        options = options.max_outline_depth(depth);
    }

    let mut results = Vec::new();

    for target in &args.targets {
        let origin_url = args.origin_url.clone().unwrap_or_else(|| {
            if target == "-" {
                String::new()
            } else {
                target.clone()
            }
        });

        match load_target(target).and_then(|fetched| parse_fetched(&fetched, &origin_url, &options)) {
            Ok(outcome) => {
                let warnings: Vec<String> = outcome.warnings.iter().map(|w| w.to_string()).collect();
                // The envelope carries the kind itself, so only the inner document is emitted.
                let document = match &outcome.document {
                    FeedDocument::Podcast(podcast) => serde_json::to_value(podcast)?,
                    FeedDocument::Opml(container) => serde_json::to_value(container)?,
                };
                results.push(json!({
                    "origin_url": origin_url,
                    "ok": true,
                    "kind": outcome.document.kind(),
                    "document": document,
                    "warnings": warnings,
                    "error": null
                }))
            }
            Err(err) => {
                tracing::warn!(input = %target, error = %err, "failed to parse target");
                results.push(json!({
                    "origin_url": origin_url,
                    "ok": false,
                    "kind": null,
                    "document": null,
                    "warnings": [],
                    "error": err.to_string()
                }))
            }
        }
    }

    let parsed = results
        .iter()
        .filter(|r| r.get("ok").and_then(|v| v.as_bool()) == Some(true))
        .count();
    let failed = results.len() - parsed;

    // A single successful target prints its result object; anything else gets an envelope.
    let output = if results.len() == 1 && parsed == 1 {
        results.remove(0)
    } else {
        json!({
            "results": results,
            "total": args.targets.len(),
            "parsed": parsed,
            "failed": failed
        })
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

/// Checks the declared content type, falling back to sniffing the bytes when
/// the transport's claim is not one we recognize.
fn parse_fetched(fetched: &Fetched, origin_url: &str, options: &ParseOptions) -> Result<ParseOutcome> {
    let declared = fetched.content_type.as_deref().unwrap_or("");
    if !supports_content_type(declared) {
        if !try_magic(&fetched.bytes) {
            bail!("unsupported content type {declared:?}");
        }
        tracing::info!(content_type = %declared, "content type not recognized, but document looks like a feed");
    }

    Ok(load_with_options(fetched.bytes.as_slice(), origin_url, options)?)
}

fn load_target(target: &str) -> Result<Fetched> {
    if target == "-" {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        return Ok(Fetched {
            bytes,
            content_type: None,
        });
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        let resp = reqwest::blocking::get(target)?.error_for_status()?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes()?.to_vec();
        return Ok(Fetched {
            bytes,
            content_type,
        });
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    Ok(Fetched {
        bytes: fs::read(path)?,
        content_type: None,
    })
}
