//! Frame decoding down to the TCP payload.
//!
//! [`decode_frame`] walks Ethernet, IPv4 and TCP headers and hands back the
//! header fields together with the payload bytes. It keeps no state.
//!
//! ## Example
//!
//! ```rust
//! use mysqltap_core::protocol::decode_frame;
//!
//! // An ARP frame is not IPv4/TCP and is skipped.
//! let mut frame = vec![0u8; 42];
//! frame[12..14].copy_from_slice(&[0x08, 0x06]);
//! assert!(decode_frame(&frame).unwrap().is_none());
//! ```

pub mod ethernet;
pub mod ipv4;
pub mod tcp;
pub mod test_utils;

pub use ethernet::{ethertype, format_mac, EthernetHeader, ETHERNET_HEADER_LEN};
pub use ipv4::{Ipv4Header, IP_PROTO_TCP};
pub use tcp::{flags, TcpControl, TcpHeader};

use crate::error::ProtocolError;
use crate::stream::{ConnectionKey, Endpoint};

/// One frame decoded down to its TCP payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    pub ethernet: EthernetHeader,
    pub ip: Ipv4Header,
    pub tcp: TcpHeader,
    pub payload: &'a [u8],
}

impl DecodedFrame<'_> {
    /// Sending endpoint.
    pub fn source(&self) -> Endpoint {
        Endpoint::new(self.ip.source, self.tcp.source_port)
    }

    /// Receiving endpoint.
    pub fn destination(&self) -> Endpoint {
        Endpoint::new(self.ip.destination, self.tcp.destination_port)
    }

    /// Direction-independent identity of the flow.
    pub fn connection_key(&self) -> ConnectionKey {
        ConnectionKey::new(self.source(), self.destination())
    }

    pub fn control(&self) -> TcpControl {
        self.tcp.control
    }
}

/// Decode an Ethernet frame.
///
/// Returns `Ok(None)` for frames that are not IPv4 carrying TCP. A frame too
/// short for a header it claims is an error.
pub fn decode_frame(data: &[u8]) -> Result<Option<DecodedFrame<'_>>, ProtocolError> {
    let (ethernet, rest) = EthernetHeader::parse(data)?;
    if !ethernet.is_ipv4() {
        return Ok(None);
    }

    let (ip, rest) = Ipv4Header::parse(rest)?;
    if !ip.is_tcp() {
        return Ok(None);
    }

    let (tcp, payload) = TcpHeader::parse(rest)?;

    Ok(Some(DecodedFrame {
        ethernet,
        ip,
        tcp,
        payload,
    }))
}
