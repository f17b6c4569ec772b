//! # mysqltap-core
//!
//! Reconstructs MySQL client/server conversations from packet captures and
//! aggregates query timings by statement shape.
//!
//! This crate holds everything except the command line: capture reading,
//! frame decoding, TCP connection tracking, MySQL protocol tracking, SQL
//! shape derivation and mergeable statistics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mysqltap_core::prelude::*;
//!
//! let (stats, counters) = analyze_file("capture.pcap", TableConfig::default()).unwrap();
//! println!("{} queries, {} connections", counters.queries, counters.connections_opened);
//!
//! for row in stats.ranked().iter().take(10) {
//!     println!("{:>10} us  {:>6}x  {}", row.total_latency_us, row.count, row.shape);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        mysqltap-core                                |
//! +---------------------------------------------------------------------+
//! |  pcap/       - Legacy pcap reading, gzip, RawPacket                 |
//! |  protocol/   - Ethernet / IPv4 / TCP header decoding                |
//! |  stream/     - Connection table, per-direction packet framing       |
//! |  mysql/      - Command codes, response codec, protocol state machine|
//! |  sql/        - Tokenizer, statement shapes                          |
//! |  stats/      - StatBucket, per-shape query statistics               |
//! |  analyzer    - Frame loop from reader to sink                       |
//! |  error/      - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```
//!
//! Frames are processed strictly in capture order. Each connection's state
//! is independent of every other, so captures can be split by connection,
//! analyzed separately and the resulting [`QueryStats`] merged.

pub mod analyzer;
pub mod error;
pub mod mysql;
pub mod pcap;
pub mod prelude;
pub mod protocol;
pub mod sql;
pub mod stats;
pub mod stream;

// Re-export commonly used types at crate root for convenience
pub use analyzer::{analyze_file, guess_host_mac, Analyzer};
pub use error::{Error, PcapError, ProtocolError, Result, SnapshotError};
pub use mysql::{
    Command, ProtocolStateMachine, ProtocolViolation, Query, QueryOutcome, QuerySink,
    SequenceMode,
};
pub use pcap::{PcapReader, RawPacket};
pub use protocol::{decode_frame, format_mac, DecodedFrame};
pub use sql::{ShapeKey, Statement, Token, TokenKind};
pub use stats::{Aggregate, QueryStats, ReportRow, StatBucket};
pub use stream::{
    Connection, ConnectionKey, ConnectionTable, Direction, Endpoint, PacketFramer, TableConfig,
    TableStats,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
