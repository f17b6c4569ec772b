//! mysqltap - Rank MySQL query shapes by latency from packet captures.
//!
//! The analysis itself lives in `mysqltap-core`; this crate holds the
//! command line around it.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use mysqltap::cli::{run, Args};
//!
//! fn main() -> anyhow::Result<()> {
//!     let args = Args::parse_from(["mysqltap", "--limit", "10", "capture.pcap"]);
//!     let summary = run(&args, &mut std::io::stdout())?;
//!     eprintln!("{} queries", summary.queries);
//!     Ok(())
//! }
//! ```

pub mod cli;
