//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Running captures through the analyzer, with snapshots
//! - Output formatting (table, CSV, JSON)

mod args;
mod output;
mod run;

pub use args::{Args, SequenceArg};
pub use output::{OutputFormat, OutputFormatter};
pub use run::{guess_macs, run, Summary};
