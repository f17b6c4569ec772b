//! IPv4 header decoding.

use std::net::Ipv4Addr;

use etherparse::Ipv4HeaderSlice;

use crate::error::ProtocolError;

/// Minimum IPv4 header length (IHL = 5).
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// IP protocol number for TCP.
pub const IP_PROTO_TCP: u8 = 6;

/// Decoded IPv4 header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    /// Header length in 32-bit words (low nibble of the first byte).
    pub ihl: u8,
    pub total_length: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Header length in bytes.
    pub fn header_len(&self) -> usize {
        self.ihl as usize * 4
    }

    /// Whether the datagram carries TCP.
    pub fn is_tcp(&self) -> bool {
        self.protocol == IP_PROTO_TCP
    }

    /// Decode the header, returning it with the datagram payload.
    ///
    /// The payload stops at the declared total length when that length fits
    /// inside the captured bytes, which drops Ethernet trailer padding.
    /// Otherwise it runs to the end of the captured bytes.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), ProtocolError> {
        let Some(&version_ihl) = data.first() else {
            return Err(ProtocolError::PacketTooShort {
                protocol: "ipv4",
                needed: IPV4_MIN_HEADER_LEN,
                have: 0,
            });
        };

        let header_len = ((version_ihl & 0x0f) as usize * 4).max(IPV4_MIN_HEADER_LEN);
        if data.len() < header_len {
            return Err(ProtocolError::PacketTooShort {
                protocol: "ipv4",
                needed: header_len,
                have: data.len(),
            });
        }

        let ipv4 = Ipv4HeaderSlice::from_slice(data).map_err(|e| ProtocolError::InvalidField {
            protocol: "ipv4",
            field: "header",
            reason: e.to_string(),
        })?;

        let header = Self {
            ihl: ipv4.ihl(),
            total_length: ipv4.total_len(),
            ttl: ipv4.ttl(),
            protocol: ipv4.protocol().0,
            source: Ipv4Addr::from(ipv4.source()),
            destination: Ipv4Addr::from(ipv4.destination()),
        };

        let declared_end = header.total_length as usize;
        let end = if declared_end >= header_len && declared_end <= data.len() {
            declared_end
        } else {
            data.len()
        };

        Ok((header, &data[header_len..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::test_utils::Ipv4Builder;

    #[test]
    fn test_parse_ipv4() {
        let packet = Ipv4Builder::new()
            .src_ip([10, 5, 6, 56])
            .dst_ip([10, 7, 5, 15])
            .ttl(64)
            .payload(vec![0xde, 0xad])
            .build();

        let (header, payload) = Ipv4Header::parse(&packet).unwrap();
        assert_eq!(header.ihl, 5);
        assert_eq!(header.header_len(), 20);
        assert_eq!(header.total_length, 22);
        assert_eq!(header.ttl, 64);
        assert!(header.is_tcp());
        assert_eq!(header.source, Ipv4Addr::new(10, 5, 6, 56));
        assert_eq!(header.destination, Ipv4Addr::new(10, 7, 5, 15));
        assert_eq!(payload, &[0xde, 0xad]);
    }

    #[test]
    fn test_trailer_padding_is_dropped() {
        let mut packet = Ipv4Builder::new().payload(vec![0x01; 6]).build();
        packet.extend_from_slice(&[0x00; 8]);

        let (_, payload) = Ipv4Header::parse(&packet).unwrap();
        assert_eq!(payload, &[0x01; 6]);
    }

    #[test]
    fn test_snaplen_truncated_payload_runs_to_end() {
        let packet = Ipv4Builder::new().payload(vec![0x01; 40]).build();
        let truncated = &packet[..30];

        let (header, payload) = Ipv4Header::parse(truncated).unwrap();
        assert_eq!(header.total_length, 60);
        assert_eq!(payload.len(), 10);
    }

    #[test]
    fn test_header_longer_than_data() {
        let mut packet = Ipv4Builder::new().build();
        packet[0] = 0x46; // IHL 6 = 24 bytes, only 20 present

        let err = Ipv4Header::parse(&packet).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PacketTooShort {
                protocol: "ipv4",
                needed: 24,
                have: 20
            }
        );
    }

    #[test]
    fn test_empty() {
        assert!(matches!(
            Ipv4Header::parse(&[]),
            Err(ProtocolError::PacketTooShort { have: 0, .. })
        ));
    }
}
