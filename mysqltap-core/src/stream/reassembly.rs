//! MySQL packet framing over one direction of a TCP byte stream.

/// Size of the MySQL packet header: 3-byte length plus sequence number.
pub const MYSQL_HEADER_LEN: usize = 4;

/// A length-framed MySQL packet, before direction and timing are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedPacket {
    pub sequence: u8,
    pub body: Vec<u8>,
}

/// Byte accumulator that yields complete MySQL packets.
///
/// Payload bytes are appended in arrival order. A packet is yielded only
/// once its header and the full declared body are buffered, so packets may
/// span several frames and one frame may carry several packets.
#[derive(Debug, Default)]
pub struct PacketFramer {
    buffer: Vec<u8>,
    /// Start of the first unconsumed byte in `buffer`.
    cursor: usize,
    packets_framed: u64,
    bytes_received: u64,
}

impl PacketFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append TCP payload bytes.
    pub fn push(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.compact();
        self.buffer.extend_from_slice(data);
        self.bytes_received += data.len() as u64;
    }

    /// Take the next complete packet, if one is buffered.
    pub fn next_packet(&mut self) -> Option<FramedPacket> {
        let available = &self.buffer[self.cursor..];
        if available.len() < MYSQL_HEADER_LEN {
            return None;
        }

        let body_len = u32::from_le_bytes([available[0], available[1], available[2], 0]) as usize;
        let total = MYSQL_HEADER_LEN + body_len;
        if available.len() < total {
            return None;
        }

        let packet = FramedPacket {
            sequence: available[3],
            body: available[MYSQL_HEADER_LEN..total].to_vec(),
        };
        self.cursor += total;
        self.packets_framed += 1;
        Some(packet)
    }

    /// Bytes buffered but not yet framed.
    pub fn available(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn packets_framed(&self) -> u64 {
        self.packets_framed
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Drop all buffered bytes and release the allocation.
    pub fn clear(&mut self) {
        self.buffer = Vec::new();
        self.cursor = 0;
    }

    fn compact(&mut self) {
        if self.cursor == 0 {
            return;
        }
        if self.cursor == self.buffer.len() {
            self.buffer.clear();
        } else {
            self.buffer.drain(..self.cursor);
        }
        self.cursor = 0;
    }
}

impl Iterator for PacketFramer {
    type Item = FramedPacket;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet()
    }
}
