//! Command-line argument definitions.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use mysqltap_core::mysql::DEFAULT_SERVER_PORT;
use mysqltap_core::{SequenceMode, TableConfig};

use super::OutputFormat;

/// Sequence numbering expected within a command cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SequenceArg {
    /// Each direction counts from 0 for every command
    PerDirection,
    /// One counter shared by both directions (MySQL wire behavior)
    Shared,
}

impl From<SequenceArg> for SequenceMode {
    fn from(arg: SequenceArg) -> Self {
        match arg {
            SequenceArg::PerDirection => SequenceMode::PerDirection,
            SequenceArg::Shared => SequenceMode::Shared,
        }
    }
}

/// Rank MySQL query shapes by latency from packet captures.
#[derive(Parser, Debug)]
#[command(name = "mysqltap")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture files, analyzed in order (plain or gzip pcap)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// TCP port of the MySQL server
    #[arg(short = 'p', long = "server-port", default_value_t = DEFAULT_SERVER_PORT)]
    pub server_port: u16,

    /// Sequence numbering expected within a command cycle
    #[arg(long = "sequence-mode", value_enum, default_value = "per-direction")]
    pub sequence_mode: SequenceArg,

    /// Output format for stdout
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Only print the top N shapes
    #[arg(short = 'n', long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Show a progress spinner on stderr
    #[arg(long = "progress")]
    pub progress: bool,

    /// Write the collected statistics to a snapshot file
    #[arg(long = "save-snapshot", value_name = "SNAPSHOT")]
    pub save_snapshot: Option<PathBuf>,

    /// Merge statistics from a snapshot file (repeatable)
    #[arg(long = "merge-snapshot", value_name = "SNAPSHOT")]
    pub merge_snapshot: Vec<PathBuf>,

    /// Print the most frequent MAC address of each capture and exit
    #[arg(long = "guess-mac")]
    pub guess_mac: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn table_config(&self) -> TableConfig {
        TableConfig {
            server_port: self.server_port,
            sequence_mode: self.sequence_mode.into(),
        }
    }

    /// Whether there is anything to report on.
    pub fn has_input(&self) -> bool {
        !self.files.is_empty() || !self.merge_snapshot.is_empty()
    }

    /// Default log filter for the `-v` count.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["mysqltap", "a.pcap", "b.pcap.gz"]);
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.table_config(), TableConfig::default());
        assert_eq!(args.format, OutputFormat::Table);
        assert_eq!(args.limit, None);
        assert!(args.has_input());
        assert_eq!(args.log_filter(), "warn");
    }

    #[test]
    fn test_options() {
        let args = Args::parse_from([
            "mysqltap",
            "--server-port",
            "3307",
            "--sequence-mode",
            "shared",
            "--format",
            "json",
            "-n",
            "5",
            "--merge-snapshot",
            "a.snap",
            "--merge-snapshot",
            "b.snap",
            "-vv",
        ]);
        assert!(args.files.is_empty());
        assert!(args.has_input());
        assert_eq!(args.table_config().server_port, 3307);
        assert_eq!(args.table_config().sequence_mode, SequenceMode::Shared);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.merge_snapshot.len(), 2);
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn test_no_input() {
        let args = Args::parse_from(["mysqltap", "--progress"]);
        assert!(!args.has_input());
    }
}
