//! mysqltap CLI entry point.

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mysqltap::cli::{guess_macs, run, Args};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()),
        )
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.guess_mac {
        return guess_macs(&args, &mut out);
    }

    let summary = run(&args, &mut out)?;
    out.flush()?;

    eprintln!(
        "{} queries in {} shapes ({} connections, {} corrupted)",
        summary.queries,
        summary.shapes,
        summary.counters.connections_opened,
        summary.counters.connections_corrupted
    );
    Ok(())
}
