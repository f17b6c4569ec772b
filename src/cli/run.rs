//! Report pipeline behind the command line.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use mysqltap_core::analyzer::MAC_GUESS_FRAMES;
use mysqltap_core::{format_mac, guess_host_mac, Analyzer, PcapReader, QueryStats, TableStats};

use super::{Args, OutputFormatter};

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub counters: TableStats,
    /// Queries in the report, merged snapshots included.
    pub queries: u64,
    pub shapes: usize,
}

/// Analyze the captures, merge snapshots and write the report to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<Summary> {
    if !args.has_input() {
        bail!("At least one capture file or --merge-snapshot is required. Use --help for usage.");
    }

    let (mut stats, counters) = analyze(args)?;

    for snapshot in &args.merge_snapshot {
        let bytes = std::fs::read(snapshot)
            .with_context(|| format!("Failed to read snapshot: {}", snapshot.display()))?;
        stats
            .merge_bytes(&bytes)
            .with_context(|| format!("Failed to merge snapshot: {}", snapshot.display()))?;
    }

    if let Some(path) = &args.save_snapshot {
        save_snapshot(&stats, path)?;
    }

    let mut rows = stats.ranked();
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }
    OutputFormatter::new(args.format).write(&rows, out)?;

    Ok(Summary {
        counters,
        queries: stats.queries(),
        shapes: stats.shapes(),
    })
}

fn analyze(args: &Args) -> Result<(QueryStats, TableStats)> {
    let progress = args.progress.then(spinner);
    let mut analyzer = Analyzer::new(args.table_config(), QueryStats::new());

    for file in &args.files {
        analyzer
            .run_file(file, |stats| {
                if let Some(pb) = &progress {
                    pb.set_message(format!(
                        "{} frames, {} queries",
                        stats.frames, stats.queries
                    ));
                    pb.tick();
                }
            })
            .with_context(|| format!("Failed to analyze capture: {}", file.display()))?;
    }

    let (stats, counters) = analyzer.finish();
    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "{} frames, {} queries",
            counters.frames, counters.queries
        ));
    }
    Ok((stats, counters))
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
        .map(|style| style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message("Reading capture...");
    pb
}

fn save_snapshot(stats: &QueryStats, path: &Path) -> Result<()> {
    let bytes = stats.to_bytes().context("Failed to encode snapshot")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
    tracing::info!(path = %path.display(), shapes = stats.shapes(), "snapshot saved");
    Ok(())
}

/// Print the most frequent MAC address of each capture.
pub fn guess_macs<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    if args.files.is_empty() {
        bail!("--guess-mac needs at least one capture file");
    }

    for file in &args.files {
        let mut reader = PcapReader::open(file)
            .with_context(|| format!("Failed to open capture: {}", file.display()))?;
        match guess_host_mac(&mut reader, MAC_GUESS_FRAMES)? {
            Some(mac) => writeln!(out, "{}\t{}", file.display(), format_mac(&mac))?,
            None => writeln!(out, "{}\t-", file.display())?,
        }
    }
    Ok(())
}
