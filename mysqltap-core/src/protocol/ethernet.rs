//! Ethernet II header decoding.

use etherparse::Ethernet2HeaderSlice;

use crate::error::ProtocolError;

/// Length of an Ethernet II header.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Well-known EtherType values (IEEE 802).
#[allow(dead_code)]
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const VLAN: u16 = 0x8100;
    pub const IPV6: u16 = 0x86DD;
}

/// Decoded Ethernet II header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub destination: [u8; 6],
    pub source: [u8; 6],
    pub ethertype: u16,
}

impl EthernetHeader {
    /// Decode the header, returning it with the bytes that follow.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), ProtocolError> {
        if data.len() < ETHERNET_HEADER_LEN {
            return Err(ProtocolError::PacketTooShort {
                protocol: "ethernet",
                needed: ETHERNET_HEADER_LEN,
                have: data.len(),
            });
        }

        let eth = Ethernet2HeaderSlice::from_slice(data).map_err(|e| {
            ProtocolError::InvalidField {
                protocol: "ethernet",
                field: "header",
                reason: e.to_string(),
            }
        })?;

        let header = Self {
            destination: eth.destination(),
            source: eth.source(),
            ethertype: eth.ether_type().0,
        };

        Ok((header, &data[ETHERNET_HEADER_LEN..]))
    }

    /// Whether the frame carries IPv4.
    pub fn is_ipv4(&self) -> bool {
        self.ethertype == ethertype::IPV4
    }
}

/// Format a hardware address as colon-separated hex.
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::test_utils::EthernetBuilder;

    #[test]
    fn test_parse_ethernet() {
        let frame = EthernetBuilder::new()
            .src_mac([0x00, 0x19, 0xb9, 0xf3, 0xb4, 0xb5])
            .dst_mac([0x00, 0x19, 0xb9, 0xb4, 0x73, 0xe4])
            .payload(vec![1, 2, 3])
            .build();

        let (header, rest) = EthernetHeader::parse(&frame).unwrap();
        assert_eq!(header.source, [0x00, 0x19, 0xb9, 0xf3, 0xb4, 0xb5]);
        assert_eq!(header.destination, [0x00, 0x19, 0xb9, 0xb4, 0x73, 0xe4]);
        assert!(header.is_ipv4());
        assert_eq!(rest, &[1, 2, 3]);
    }

    #[test]
    fn test_parse_too_short() {
        let err = EthernetHeader::parse(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PacketTooShort {
                protocol: "ethernet",
                needed: 14,
                have: 10
            }
        );
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(
            format_mac(&[0x00, 0x19, 0xb9, 0xbe, 0x1c, 0x4d]),
            "00:19:b9:be:1c:4d"
        );
    }
}
