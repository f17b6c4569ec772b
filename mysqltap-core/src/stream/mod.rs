//! TCP connection tracking and MySQL packet framing.
//!
//! ## Components
//!
//! - [`ConnectionTable`] - Opens connections on SYN, drops them on FIN
//! - [`Connection`] - One MySQL conversation: two framers and a state machine
//! - [`PacketFramer`] - Cuts one direction's byte stream into MySQL packets
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysqltap_core::mysql::Query;
//! use mysqltap_core::pcap::PcapReader;
//! use mysqltap_core::stream::{ConnectionTable, TableConfig};
//!
//! let mut table = ConnectionTable::new(TableConfig::default(), |q: Query| {
//!     println!("{} us: {}", q.latency_us(), q.sql);
//! });
//! for frame in PcapReader::open("capture.pcap").unwrap() {
//!     table.on_frame(&frame.unwrap()).unwrap();
//! }
//! ```

mod connection;
mod context;
mod manager;
mod reassembly;

pub use connection::{Connection, ConnectionKey, Endpoint};
pub use context::Direction;
pub use manager::{ConnectionTable, TableConfig, TableStats};
pub use reassembly::{FramedPacket, PacketFramer, MYSQL_HEADER_LEN};
