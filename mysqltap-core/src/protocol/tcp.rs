//! TCP header decoding.

use std::fmt;

use smallvec::SmallVec;

use etherparse::TcpHeaderSlice;

use crate::error::ProtocolError;

/// Minimum TCP header length (data offset = 5).
pub const TCP_MIN_HEADER_LEN: usize = 20;

/// TCP control bits as they appear in byte 13 of the header.
#[allow(dead_code)]
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
    pub const ECN: u8 = 0x40;
    pub const CWR: u8 = 0x80;
}

const FLAG_NAMES: [(u8, &str); 8] = [
    (flags::FIN, "FIN"),
    (flags::SYN, "SYN"),
    (flags::RST, "RST"),
    (flags::PSH, "PSH"),
    (flags::ACK, "ACK"),
    (flags::URG, "URG"),
    (flags::ECN, "ECN"),
    (flags::CWR, "CWR"),
];

/// Set of TCP control flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TcpControl(u8);

impl TcpControl {
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `flag` is set.
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub const fn is_syn(self) -> bool {
        self.contains(flags::SYN)
    }

    pub const fn is_fin(self) -> bool {
        self.contains(flags::FIN)
    }

    /// Names of the set flags, lowest bit first.
    pub fn names(self) -> SmallVec<[&'static str; 8]> {
        FLAG_NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Debug for TcpControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TcpControl({})", self)
    }
}

impl fmt::Display for TcpControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

/// Decoded TCP header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    /// Data offset in 32-bit words.
    pub data_offset: u8,
    pub control: TcpControl,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
}

impl TcpHeader {
    /// Header length in bytes, options included.
    pub fn header_len(&self) -> usize {
        self.data_offset as usize * 4
    }

    /// Decode the header, returning it with the segment payload.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), ProtocolError> {
        if data.len() < TCP_MIN_HEADER_LEN {
            return Err(ProtocolError::PacketTooShort {
                protocol: "tcp",
                needed: TCP_MIN_HEADER_LEN,
                have: data.len(),
            });
        }

        let data_offset = data[12] >> 4;
        let header_len = data_offset as usize * 4;
        if header_len < TCP_MIN_HEADER_LEN {
            return Err(ProtocolError::InvalidField {
                protocol: "tcp",
                field: "data_offset",
                reason: format!("{} words is below the 5 word minimum", data_offset),
            });
        }
        if data.len() < header_len {
            return Err(ProtocolError::PacketTooShort {
                protocol: "tcp",
                needed: header_len,
                have: data.len(),
            });
        }

        let tcp = TcpHeaderSlice::from_slice(data).map_err(|e| ProtocolError::InvalidField {
            protocol: "tcp",
            field: "header",
            reason: e.to_string(),
        })?;

        let header = Self {
            source_port: tcp.source_port(),
            destination_port: tcp.destination_port(),
            sequence_number: tcp.sequence_number(),
            acknowledgment_number: tcp.acknowledgment_number(),
            data_offset,
            // Byte 13 holds all eight control bits.
            control: TcpControl::from_bits(data[13]),
            window: tcp.window_size(),
            checksum: tcp.checksum(),
            urgent_pointer: tcp.urgent_pointer(),
        };

        Ok((header, &data[header_len..]))
    }
}
