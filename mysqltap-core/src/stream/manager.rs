use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Connection, ConnectionKey, Direction};
use crate::error::ProtocolError;
use crate::mysql::{QuerySink, SequenceMode, DEFAULT_SERVER_PORT};
use crate::pcap::RawPacket;
use crate::protocol::{decode_frame, DecodedFrame};

/// Configuration for the ConnectionTable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Destination port that marks client to server traffic.
    pub server_port: u16,
    /// Sequence numbering expected inside a command cycle.
    pub sequence_mode: SequenceMode,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            sequence_mode: SequenceMode::PerDirection,
        }
    }
}

/// Counters kept by the ConnectionTable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub frames: u64,
    /// Frames that were not IPv4/TCP.
    pub frames_skipped: u64,
    /// TCP frames with no live connection.
    pub frames_unmatched: u64,
    pub connections_opened: u64,
    /// SYNs that replaced a live connection with the same key.
    pub connections_replaced: u64,
    pub connections_closed: u64,
    pub connections_corrupted: u64,
    pub queries: u64,
}

/// Live MySQL connections keyed by endpoint pair.
///
/// A SYN creates (or replaces) the connection for its key, a FIN removes it,
/// and payload for a live connection is routed to the framer for its
/// direction. Frames for keys never seen at SYN time are dropped.
pub struct ConnectionTable<S> {
    connections: HashMap<ConnectionKey, Connection>,
    next_id: u64,
    config: TableConfig,
    stats: TableStats,
    sink: S,
}

impl<S: QuerySink> ConnectionTable<S> {
    pub fn new(config: TableConfig, sink: S) -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 1,
            config,
            stats: TableStats::default(),
            sink,
        }
    }

    /// Create with default config.
    pub fn with_sink(sink: S) -> Self {
        Self::new(TableConfig::default(), sink)
    }

    /// Decode a captured frame and process it.
    ///
    /// Only a truncated or malformed frame header is an error. Protocol
    /// violations stay inside their connection.
    pub fn on_frame(&mut self, frame: &RawPacket) -> Result<(), ProtocolError> {
        self.stats.frames += 1;

        match decode_frame(&frame.data)? {
            Some(decoded) => self.on_segment(&decoded, frame.frame_number, frame.timestamp_us),
            None => {
                self.stats.frames_skipped += 1;
                tracing::trace!(frame = frame.frame_number, "skipping non IPv4/TCP frame");
            }
        }
        Ok(())
    }

    /// Process one decoded TCP segment.
    pub fn on_segment(&mut self, segment: &DecodedFrame<'_>, frame_number: u64, timestamp: i64) {
        let key = segment.connection_key();
        let control = segment.control();

        // A segment carrying both SYN and FIN only opens.
        if control.is_syn() {
            self.open(key, segment, frame_number, timestamp);
        } else if control.is_fin() {
            if let Some(conn) = self.connections.remove(&key) {
                self.stats.connections_closed += 1;
                tracing::debug!(
                    connection = conn.id,
                    %key,
                    queries = conn.queries,
                    "connection closed"
                );
            }
        }

        let Some(conn) = self.connections.get_mut(&key) else {
            self.stats.frames_unmatched += 1;
            return;
        };

        if segment.payload.is_empty() {
            conn.last_activity = timestamp;
            conn.last_frame = frame_number;
            return;
        }

        let direction =
            Direction::from_destination_port(segment.tcp.destination_port, self.config.server_port);

        match conn.feed(direction, segment.payload, frame_number, timestamp, &mut self.sink) {
            Ok(emitted) => self.stats.queries += emitted,
            Err(violation) => {
                self.stats.connections_corrupted += 1;
                tracing::warn!(
                    connection = conn.id,
                    %key,
                    frame = frame_number,
                    %direction,
                    error = %violation,
                    "protocol violation, ignoring connection"
                );
            }
        }
    }

    fn open(
        &mut self,
        key: ConnectionKey,
        segment: &DecodedFrame<'_>,
        frame_number: u64,
        timestamp: i64,
    ) {
        let id = self.next_id;
        self.next_id += 1;

        let conn = Connection::new(
            id,
            key,
            segment.source(),
            self.config.sequence_mode,
            frame_number,
            timestamp,
        );
        self.stats.connections_opened += 1;

        if let Some(old) = self.connections.insert(key, conn) {
            self.stats.connections_replaced += 1;
            tracing::debug!(old = old.id, new = id, %key, "SYN replaced live connection");
        } else {
            tracing::debug!(connection = id, %key, "connection opened");
        }
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Get a connection by key.
    pub fn get(&self, key: &ConnectionKey) -> Option<&Connection> {
        self.connections.get(key)
    }

    /// Get all live connections.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn stats(&self) -> &TableStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// End of input: discard live connections and return the sink.
    ///
    /// Queries still waiting for their response are lost.
    pub fn finish(self) -> (S, TableStats) {
        let in_flight = self
            .connections
            .values()
            .filter(|c| c.machine().has_pending())
            .count();
        if !self.connections.is_empty() {
            tracing::debug!(
                live = self.connections.len(),
                in_flight,
                "discarding connections still open at end of capture"
            );
        }
        (self.sink, self.stats)
    }
}
