//! PCAP file reading module.
//!
//! This module handles reading classic little-endian PCAP captures and
//! exposing raw frames for decoding.
//!
//! The main types are:
//! - [`PcapReader`] - Reader over any byte source, with gzip handling for files
//! - [`RawPacket`] - One captured frame plus its capture timestamp

mod packet;
mod reader;

pub use packet::RawPacket;
pub use reader::{PcapReader, GLOBAL_HEADER_LEN, PCAP_MAGIC};

/// Link type constant for Ethernet.
pub const LINKTYPE_ETHERNET: u16 = 1;
