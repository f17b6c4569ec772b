use std::fmt;
use std::net::Ipv4Addr;

use super::{Direction, PacketFramer};
use crate::mysql::{
    MysqlPacket, ProtocolStateMachine, ProtocolViolation, QuerySink, SequenceMode,
};

/// One side of a TCP connection.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Endpoint {
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

/// Normalized connection key (lower endpoint first for consistent lookup).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ConnectionKey {
    a: Endpoint,
    b: Endpoint,
}

impl ConnectionKey {
    /// Create a normalized connection key.
    /// Ensures a <= b, so both directions of a flow share one key.
    pub fn new(src: Endpoint, dst: Endpoint) -> Self {
        if src <= dst {
            Self { a: src, b: dst }
        } else {
            Self { a: dst, b: src }
        }
    }

    /// Both endpoints, lower first.
    pub fn endpoints(&self) -> (Endpoint, Endpoint) {
        (self.a, self.b)
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}

/// A tracked MySQL connection: two framers feeding one state machine.
#[derive(Debug)]
pub struct Connection {
    pub id: u64,
    pub key: ConnectionKey,
    /// Sender of the SYN that opened the connection.
    pub opened_by: Endpoint,

    /// Timing (microseconds).
    pub opened_at: i64,
    pub last_activity: i64,

    /// Frame references.
    pub first_frame: u64,
    pub last_frame: u64,

    /// Queries emitted so far.
    pub queries: u64,

    to_server: PacketFramer,
    from_server: PacketFramer,
    machine: ProtocolStateMachine,
}

impl Connection {
    pub fn new(
        id: u64,
        key: ConnectionKey,
        opened_by: Endpoint,
        mode: SequenceMode,
        frame_number: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            key,
            opened_by,
            opened_at: timestamp,
            last_activity: timestamp,
            first_frame: frame_number,
            last_frame: frame_number,
            queries: 0,
            to_server: PacketFramer::new(),
            from_server: PacketFramer::new(),
            machine: ProtocolStateMachine::new(id, mode),
        }
    }

    pub fn machine(&self) -> &ProtocolStateMachine {
        &self.machine
    }

    pub fn is_corrupted(&self) -> bool {
        self.machine.is_corrupted()
    }

    /// Bytes received in one direction.
    pub fn bytes(&self, direction: Direction) -> u64 {
        match direction {
            Direction::ToServer => self.to_server.bytes_received(),
            Direction::FromServer => self.from_server.bytes_received(),
        }
    }

    /// Feed one segment's payload and run every packet it completes through
    /// the state machine, handing finished queries to `sink`.
    ///
    /// Returns the number of queries emitted. On a violation the buffers are
    /// released and later payloads are ignored.
    pub fn feed<S: QuerySink + ?Sized>(
        &mut self,
        direction: Direction,
        payload: &[u8],
        frame_number: u64,
        timestamp: i64,
        sink: &mut S,
    ) -> Result<u64, ProtocolViolation> {
        self.last_activity = timestamp;
        self.last_frame = frame_number;

        if self.machine.is_corrupted() {
            return Ok(0);
        }

        let framer = match direction {
            Direction::ToServer => &mut self.to_server,
            Direction::FromServer => &mut self.from_server,
        };
        framer.push(payload);

        let mut emitted = 0;
        while let Some(framed) = framer.next_packet() {
            let packet = MysqlPacket {
                direction,
                sequence: framed.sequence,
                body: framed.body,
                frame_number,
                timestamp_us: timestamp,
            };

            match self.machine.step(&packet) {
                Ok(Some(query)) => {
                    sink.on_query(query);
                    emitted += 1;
                }
                Ok(None) => {}
                Err(violation) => {
                    self.queries += emitted;
                    self.to_server.clear();
                    self.from_server.clear();
                    return Err(violation);
                }
            }
        }

        self.queries += emitted;
        Ok(emitted)
    }
}
