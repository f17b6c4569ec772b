//! Error types for mysqltap-core.
//!
//! This module provides the structured errors that can stop a run:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`PcapError`] - Errors from reading the capture container
//! - [`ProtocolError`] - Errors from decoding a captured frame's headers
//! - [`SnapshotError`] - Errors from restoring a statistics snapshot
//!
//! Conditions that only affect one connection or one statement are not
//! errors at this level: see [`crate::mysql::ProtocolViolation`] and
//! [`crate::sql::LexError`].
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use thiserror::Error;

/// Main error type for mysqltap-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error reading the capture container
    #[error("PCAP error: {0}")]
    Pcap(#[from] PcapError),

    /// Error decoding a captured frame
    #[error("Frame decode error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error restoring a statistics snapshot
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PCAP file reading.
#[derive(Error, Debug)]
pub enum PcapError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Invalid PCAP format
    #[error("Invalid PCAP format: {reason}")]
    InvalidFormat { reason: String },

    /// The magic number is the byte-swapped form of the expected one.
    #[error("Wrong byte order: magic number read as {magic:#010x}, expected 0xa1b2c3d4")]
    WrongByteOrder { magic: u32 },

    /// Unsupported link type
    #[error("Unsupported link type: {link_type}")]
    UnsupportedLinkType { link_type: u16 },
}

/// Errors related to frame header decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame too short for a claimed header
    #[error("{protocol}: packet too short (need {needed} bytes, have {have})")]
    PacketTooShort {
        protocol: &'static str,
        needed: usize,
        have: usize,
    },

    /// Invalid header field value
    #[error("{protocol}: invalid {field}: {reason}")]
    InvalidField {
        protocol: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// Errors related to statistics snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Blob could not be decoded
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] bincode::Error),

    /// Blob was written by an incompatible version
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
