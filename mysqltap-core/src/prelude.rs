//! Convenient re-exports for common usage.
//!
//! # Example
//!
//! ```rust,no_run
//! use mysqltap_core::prelude::*;
//!
//! let mut analyzer = Analyzer::new(TableConfig::default(), QueryStats::new());
//! analyzer.run_file("capture.pcap.gz", |_| {}).unwrap();
//! let (stats, _) = analyzer.finish();
//! ```

// Reading and driving
pub use crate::analyzer::{analyze_file, Analyzer};
pub use crate::pcap::{PcapReader, RawPacket};
pub use crate::stream::{ConnectionTable, TableConfig, TableStats};

// Protocol tracking
pub use crate::mysql::{Query, QueryOutcome, QuerySink, SequenceMode};

// Shapes and statistics
pub use crate::sql::{ShapeKey, Statement};
pub use crate::stats::{QueryStats, ReportRow, StatBucket};

// Error types
pub use crate::error::{Error, Result};
