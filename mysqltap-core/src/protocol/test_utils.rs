//! Builders for synthetic frames and captures.
//!
//! Used by unit tests, integration tests and fuzz seeds to assemble
//! Ethernet/IPv4/TCP frames, MySQL packets and whole pcap files.

use crate::pcap::{RawPacket, LINKTYPE_ETHERNET, PCAP_MAGIC};

use super::ethernet::ethertype;
use super::ipv4::IP_PROTO_TCP;
use super::tcp::flags;

/// Builder for constructing Ethernet frames.
#[derive(Debug, Clone)]
pub struct EthernetBuilder {
    src_mac: [u8; 6],
    dst_mac: [u8; 6],
    ethertype: u16,
    payload: Vec<u8>,
}

impl Default for EthernetBuilder {
    fn default() -> Self {
        Self {
            src_mac: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            dst_mac: [0x00, 0x66, 0x77, 0x88, 0x99, 0xaa],
            ethertype: ethertype::IPV4,
            payload: Vec::new(),
        }
    }
}

impl EthernetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_mac(mut self, mac: [u8; 6]) -> Self {
        self.src_mac = mac;
        self
    }

    pub fn dst_mac(mut self, mac: [u8; 6]) -> Self {
        self.dst_mac = mac;
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(14 + self.payload.len());
        frame.extend_from_slice(&self.dst_mac);
        frame.extend_from_slice(&self.src_mac);
        frame.extend_from_slice(&self.ethertype.to_be_bytes());
        frame.extend_from_slice(&self.payload);
        frame
    }
}

/// Builder for constructing IPv4 headers.
#[derive(Debug, Clone)]
pub struct Ipv4Builder {
    identification: u16,
    ttl: u8,
    protocol: u8,
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    payload: Vec<u8>,
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Self {
            identification: 0x0001,
            ttl: 64,
            protocol: IP_PROTO_TCP,
            src_ip: [192, 168, 1, 1],
            dst_ip: [192, 168, 1, 2],
            payload: Vec::new(),
        }
    }
}

impl Ipv4Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    pub fn src_ip(mut self, ip: [u8; 4]) -> Self {
        self.src_ip = ip;
        self
    }

    pub fn dst_ip(mut self, ip: [u8; 4]) -> Self {
        self.dst_ip = ip;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let total_length = 20 + self.payload.len() as u16;
        let mut header = Vec::with_capacity(20 + self.payload.len());

        header.push(0x45); // Version 4, IHL 5
        header.push(0x00);
        header.extend_from_slice(&total_length.to_be_bytes());
        header.extend_from_slice(&self.identification.to_be_bytes());
        header.extend_from_slice(&[0x40, 0x00]); // Don't fragment
        header.push(self.ttl);
        header.push(self.protocol);
        header.extend_from_slice(&[0x00, 0x00]); // Checksum (not calculated)
        header.extend_from_slice(&self.src_ip);
        header.extend_from_slice(&self.dst_ip);
        header.extend_from_slice(&self.payload);

        header
    }
}

/// Builder for constructing TCP headers.
#[derive(Debug, Clone)]
pub struct TcpBuilder {
    src_port: u16,
    dst_port: u16,
    seq: u32,
    ack: u32,
    flags: u8,
    window: u16,
    options: Vec<u8>,
    payload: Vec<u8>,
}

impl Default for TcpBuilder {
    fn default() -> Self {
        Self {
            src_port: 51234,
            dst_port: 3306,
            seq: 1,
            ack: 0,
            flags: flags::ACK,
            window: 65535,
            options: Vec::new(),
            payload: Vec::new(),
        }
    }
}

impl TcpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    pub fn seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    pub fn ack_num(mut self, ack: u32) -> Self {
        self.ack = ack;
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn syn(self) -> Self {
        self.flags(flags::SYN)
    }

    pub fn fin(self) -> Self {
        self.flags(flags::FIN | flags::ACK)
    }

    pub fn psh_ack(self) -> Self {
        self.flags(flags::PSH | flags::ACK)
    }

    pub fn window(mut self, window: u16) -> Self {
        self.window = window;
        self
    }

    /// Raw option bytes, padded to a 4-byte boundary on build.
    pub fn options(mut self, options: Vec<u8>) -> Self {
        self.options = options;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut options = self.options;
        while options.len() % 4 != 0 {
            options.push(0x00);
        }
        let data_offset = (20 + options.len()) / 4;

        let mut header = Vec::with_capacity(data_offset * 4 + self.payload.len());
        header.extend_from_slice(&self.src_port.to_be_bytes());
        header.extend_from_slice(&self.dst_port.to_be_bytes());
        header.extend_from_slice(&self.seq.to_be_bytes());
        header.extend_from_slice(&self.ack.to_be_bytes());
        header.push((data_offset as u8) << 4);
        header.push(self.flags);
        header.extend_from_slice(&self.window.to_be_bytes());
        header.extend_from_slice(&[0x00, 0x00]); // Checksum
        header.extend_from_slice(&[0x00, 0x00]); // Urgent pointer
        header.extend_from_slice(&options);
        header.extend_from_slice(&self.payload);

        header
    }
}

/// Build a complete Ethernet/IPv4/TCP frame.
pub fn build_tcp_frame(
    src: ([u8; 4], u16),
    dst: ([u8; 4], u16),
    flags: u8,
    payload: &[u8],
) -> Vec<u8> {
    let tcp = TcpBuilder::new()
        .src_port(src.1)
        .dst_port(dst.1)
        .flags(flags)
        .payload(payload.to_vec())
        .build();

    let ipv4 = Ipv4Builder::new()
        .src_ip(src.0)
        .dst_ip(dst.0)
        .payload(tcp)
        .build();

    EthernetBuilder::new().payload(ipv4).build()
}

/// Frame a MySQL packet body: 3-byte little-endian length, sequence, body.
pub fn mysql_packet(sequence: u8, body: &[u8]) -> Vec<u8> {
    let len = body.len() as u32;
    let mut packet = Vec::with_capacity(4 + body.len());
    packet.extend_from_slice(&len.to_le_bytes()[..3]);
    packet.push(sequence);
    packet.extend_from_slice(body);
    packet
}

/// Serialize frames as a little-endian pcap file (version 2.4, Ethernet).
pub fn encode_capture(frames: &[RawPacket]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&PCAP_MAGIC.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // thiszone
    out.extend_from_slice(&0u32.to_le_bytes()); // sigfigs
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&(LINKTYPE_ETHERNET as u32).to_le_bytes());

    for frame in frames {
        let secs = frame.timestamp_us.div_euclid(1_000_000) as u32;
        let micros = frame.timestamp_us.rem_euclid(1_000_000) as u32;
        out.extend_from_slice(&secs.to_le_bytes());
        out.extend_from_slice(&micros.to_le_bytes());
        out.extend_from_slice(&(frame.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&frame.original_length.max(frame.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&frame.data);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethernet_builder() {
        let frame = EthernetBuilder::new()
            .src_mac([0x11, 0x22, 0x33, 0x44, 0x55, 0x66])
            .dst_mac([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])
            .payload(vec![0x45, 0x00])
            .build();

        assert_eq!(frame.len(), 16);
        assert_eq!(&frame[0..6], &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(&frame[6..12], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(&frame[12..14], &[0x08, 0x00]);
    }

    #[test]
    fn test_build_tcp_frame() {
        let frame = build_tcp_frame(
            ([10, 0, 0, 1], 51234),
            ([10, 0, 0, 2], 3306),
            flags::SYN,
            &[],
        );

        // Ethernet (14) + IPv4 (20) + TCP (20)
        assert_eq!(frame.len(), 54);
        assert_eq!(frame[14 + 20 + 13], flags::SYN);
    }

    #[test]
    fn test_mysql_packet() {
        assert_eq!(mysql_packet(0, &[0x03, b'x']), vec![2, 0, 0, 0, 0x03, b'x']);
        assert_eq!(mysql_packet(7, &[0u8; 300])[..4], [0x2c, 0x01, 0x00, 0x07]);
    }

    #[test]
    fn test_encode_capture_header() {
        let data = encode_capture(&[RawPacket::ethernet(1, 2_500_000, vec![0xee; 3])]);

        assert_eq!(&data[..4], &[0xd4, 0xc3, 0xb2, 0xa1]);
        assert_eq!(data.len(), 24 + 16 + 3);
        assert_eq!(&data[24..28], &2u32.to_le_bytes());
        assert_eq!(&data[28..32], &500_000u32.to_le_bytes());
    }
}
