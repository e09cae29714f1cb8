//! DMM normalizer.
//!
//! Reads a map against an atom registry and writes it back out: duplicate
//! legend entries collapse, overrides equal to the type default disappear,
//! and (with `clean`) untouched tiles keep their keys.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DMM_CONFIG`: path to a JSON [`CodecConfig`] (optional)
//! - `RUST_LOG`: Log level filter (default: dmm_codec=info,dmm_normalize=info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin dmm_normalize --features cli -- types.json in.dmm [out.dmm]
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dmm_codec::{CodecConfig, DmmReader, DmmWriter, InMemoryAtomRegistry, MapDocument};

#[derive(Parser, Debug)]
#[command(name = "dmm_normalize", about = "Rewrite a DMM map with deduplicated legend entries")]
struct Args {
    /// Atom registry JSON
    registry: PathBuf,
    /// Map to read
    input: PathBuf,
    /// Output path (defaults to rewriting the input in place)
    output: Option<PathBuf>,
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dmm_codec=info,dmm_normalize=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();
    let input = args.input;
    let output = args.output.unwrap_or_else(|| input.clone());
    let registry_path = args.registry;

    let config = match std::env::var_os("DMM_CONFIG") {
        Some(path) => CodecConfig::from_path(&PathBuf::from(path))?,
        None => CodecConfig::default(),
    };

    let start = Instant::now();
    let registry = InMemoryAtomRegistry::from_path(&registry_path)?;
    info!(atoms = registry.len(), path = %registry_path.display(), "registry loaded");

    let mut doc = MapDocument::new();
    let read = DmmReader::new(&registry, config.reader).read_path(&input, &mut doc);
    let read = match read {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, path = %input.display(), "read failed");
            return Err(e.into());
        }
    };
    if !read.unknown_atoms.is_empty() {
        info!(unknown = ?read.unknown_atoms, "atoms missing from registry were dropped");
    }

    let written = DmmWriter::new(config.writer).write_path(&mut doc, &output)?;
    info!(
        legend_before = read.legend_entries,
        legend_after = written.legend_entries,
        reassigned = written.reassigned_keys,
        latency_ms = start.elapsed().as_millis() as u64,
        "normalized"
    );
    Ok(())
}
