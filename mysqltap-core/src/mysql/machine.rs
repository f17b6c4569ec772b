//! Per-connection MySQL protocol state machine.
//!
//! The machine is driven one packet at a time through
//! [`ProtocolStateMachine::step`], which advances the explicit [`State`] and
//! returns a [`Query`] whenever a query's response cycle completes. Any
//! violation moves the machine to [`State::Corrupted`] for good.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::{self, LengthCoded, LengthCodedError, ERR_MARKER, OK_MARKER};
use super::{Command, Query, QueryOutcome};
use crate::stream::Direction;

/// How sequence numbers are counted within a command cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceMode {
    /// Each direction counts from 0 at the start of every command.
    #[default]
    PerDirection,
    /// One counter shared by both directions, as MySQL servers number
    /// packets on the wire (command 0, first response 1, ...).
    Shared,
}

/// A framed MySQL packet with its direction and the frame that completed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MysqlPacket {
    pub direction: Direction,
    pub sequence: u8,
    pub body: Vec<u8>,
    pub frame_number: u64,
    pub timestamp_us: i64,
}

impl MysqlPacket {
    pub fn first_byte(&self) -> Option<u8> {
        self.body.first().copied()
    }
}

/// Protocol phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitHandshake,
    AwaitAuth,
    AwaitAuthResult,
    AwaitCommand,
    AwaitResponse,
    /// Field definitions still to come; at zero the fields EOF is expected.
    AwaitFields { remaining: u64 },
    AwaitRows,
    Corrupted,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::AwaitHandshake => "await_handshake",
            State::AwaitAuth => "await_auth",
            State::AwaitAuthResult => "await_auth_result",
            State::AwaitCommand => "await_command",
            State::AwaitResponse => "await_response",
            State::AwaitFields { .. } => "await_fields",
            State::AwaitRows => "await_rows",
            State::Corrupted => "corrupted",
        }
    }

    /// Direction the next packet must travel in.
    fn expected_direction(&self) -> Option<Direction> {
        match self {
            State::AwaitAuth | State::AwaitCommand => Some(Direction::ToServer),
            State::Corrupted => None,
            _ => Some(Direction::FromServer),
        }
    }
}

/// Why a connection was marked corrupted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("{state}: expected a {expected} packet, got {actual}")]
    WrongDirection {
        state: &'static str,
        expected: Direction,
        actual: Direction,
    },

    #[error("{state}: expected sequence {expected}, got {actual}")]
    SequenceMismatch {
        state: &'static str,
        expected: u8,
        actual: u8,
    },

    #[error("unknown command code {0:#04x}")]
    UnknownCommand(u8),

    #[error("{state}: empty packet body")]
    EmptyPacket { state: &'static str },

    #[error("malformed field count: {0}")]
    MalformedFieldCount(#[from] LengthCodedError),

    #[error("field count is NULL")]
    NullFieldCount,

    #[error("expected EOF after field definitions, got {first:#04x} with {len} byte body")]
    MissingFieldsEof { first: u8, len: usize },
}

#[derive(Debug, Clone)]
struct PendingQuery {
    command: Command,
    sql: Option<String>,
    issued_at: i64,
    first_response_at: i64,
    first_row_at: Option<i64>,
    last_row_at: Option<i64>,
    columns: u64,
    rows: u64,
}

impl PendingQuery {
    fn finish(self, connection_id: u64, completed_at: i64, outcome: QueryOutcome) -> Option<Query> {
        let sql = self.sql?;
        Some(Query {
            connection_id,
            command: self.command,
            sql,
            issued_at: self.issued_at,
            first_response_at: self.first_response_at,
            first_row_at: self.first_row_at,
            last_row_at: self.last_row_at,
            completed_at,
            rows: self.rows,
            outcome,
        })
    }
}

/// MySQL conversation tracker for one connection.
#[derive(Debug, Clone)]
pub struct ProtocolStateMachine {
    connection_id: u64,
    state: State,
    mode: SequenceMode,
    /// Next expected sequence number, indexed by direction (slot 0 only in
    /// shared mode).
    sequence: [u8; 2],
    pending: Option<PendingQuery>,
}

impl ProtocolStateMachine {
    pub fn new(connection_id: u64, mode: SequenceMode) -> Self {
        Self {
            connection_id,
            state: State::AwaitHandshake,
            mode,
            sequence: [0; 2],
            pending: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_corrupted(&self) -> bool {
        self.state == State::Corrupted
    }

    /// Whether a command is waiting for the end of its response.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume one packet.
    ///
    /// Packets arriving after corruption are ignored. On a violation the
    /// machine becomes corrupted and any pending query is dropped.
    pub fn step(&mut self, packet: &MysqlPacket) -> Result<Option<Query>, ProtocolViolation> {
        if self.is_corrupted() {
            return Ok(None);
        }

        match self.advance(packet) {
            Ok(query) => Ok(query),
            Err(violation) => {
                self.state = State::Corrupted;
                self.pending = None;
                Err(violation)
            }
        }
    }

    fn advance(&mut self, packet: &MysqlPacket) -> Result<Option<Query>, ProtocolViolation> {
        let state = self.state;
        self.check_direction(packet)?;

        match state {
            State::AwaitHandshake => {
                self.state = State::AwaitAuth;
                Ok(None)
            }
            State::AwaitAuth => {
                self.state = State::AwaitAuthResult;
                Ok(None)
            }
            State::AwaitAuthResult => {
                self.state = State::AwaitCommand;
                Ok(None)
            }
            State::AwaitCommand => {
                self.sequence = [0; 2];
                self.check_sequence(packet)?;
                self.on_command(packet)?;
                self.state = State::AwaitResponse;
                Ok(None)
            }
            State::AwaitResponse => {
                self.check_sequence(packet)?;
                self.on_response(packet)
            }
            State::AwaitFields { remaining } => {
                self.check_sequence(packet)?;
                if remaining > 0 {
                    self.state = State::AwaitFields {
                        remaining: remaining - 1,
                    };
                    return Ok(None);
                }
                if !codec::is_eof(&packet.body) {
                    return Err(ProtocolViolation::MissingFieldsEof {
                        first: packet.first_byte().unwrap_or(0),
                        len: packet.body.len(),
                    });
                }
                self.state = State::AwaitRows;
                Ok(None)
            }
            State::AwaitRows => {
                self.check_sequence(packet)?;
                Ok(self.on_row(packet))
            }
            State::Corrupted => Ok(None),
        }
    }

    fn on_command(&mut self, packet: &MysqlPacket) -> Result<(), ProtocolViolation> {
        let code = packet.first_byte().ok_or(ProtocolViolation::EmptyPacket {
            state: self.state.as_str(),
        })?;
        let command = Command::from_code(code).ok_or(ProtocolViolation::UnknownCommand(code))?;

        let sql = (command == Command::Query)
            .then(|| String::from_utf8_lossy(&packet.body[1..]).into_owned());

        self.pending = Some(PendingQuery {
            command,
            sql,
            issued_at: packet.timestamp_us,
            first_response_at: packet.timestamp_us,
            first_row_at: None,
            last_row_at: None,
            columns: 0,
            rows: 0,
        });
        Ok(())
    }

    fn on_response(&mut self, packet: &MysqlPacket) -> Result<Option<Query>, ProtocolViolation> {
        let first = packet.first_byte().ok_or(ProtocolViolation::EmptyPacket {
            state: self.state.as_str(),
        })?;

        if let Some(pending) = self.pending.as_mut() {
            pending.first_response_at = packet.timestamp_us;
        }

        let outcome = match first {
            OK_MARKER => Some(QueryOutcome::Ok {
                affected_rows: codec::affected_rows(&packet.body),
            }),
            ERR_MARKER => Some(QueryOutcome::Error {
                code: codec::error_code(&packet.body),
            }),
            _ => None,
        };
        if let Some(outcome) = outcome {
            self.state = State::AwaitCommand;
            return Ok(self.complete(packet.timestamp_us, outcome));
        }

        let (count, _) = codec::read_length_coded(&packet.body)?;
        let LengthCoded::Value(columns) = count else {
            return Err(ProtocolViolation::NullFieldCount);
        };
        if let Some(pending) = self.pending.as_mut() {
            pending.columns = columns;
        }
        self.state = State::AwaitFields { remaining: columns };
        Ok(None)
    }

    fn on_row(&mut self, packet: &MysqlPacket) -> Option<Query> {
        if codec::is_eof(&packet.body) {
            self.state = State::AwaitCommand;
            let columns = self.pending.as_ref().map_or(0, |p| p.columns);
            return self.complete(packet.timestamp_us, QueryOutcome::ResultSet { columns });
        }

        if let Some(pending) = self.pending.as_mut() {
            pending.first_row_at.get_or_insert(packet.timestamp_us);
            pending.last_row_at = Some(packet.timestamp_us);
            pending.rows += 1;
        }
        None
    }

    fn complete(&mut self, completed_at: i64, outcome: QueryOutcome) -> Option<Query> {
        self.pending
            .take()
            .and_then(|pending| pending.finish(self.connection_id, completed_at, outcome))
    }

    fn check_direction(&self, packet: &MysqlPacket) -> Result<(), ProtocolViolation> {
        match self.state.expected_direction() {
            Some(expected) if expected != packet.direction => Err(ProtocolViolation::WrongDirection {
                state: self.state.as_str(),
                expected,
                actual: packet.direction,
            }),
            _ => Ok(()),
        }
    }

    fn check_sequence(&mut self, packet: &MysqlPacket) -> Result<(), ProtocolViolation> {
        let slot = match (self.mode, packet.direction) {
            (SequenceMode::Shared, _) | (SequenceMode::PerDirection, Direction::ToServer) => 0,
            (SequenceMode::PerDirection, Direction::FromServer) => 1,
        };

        let expected = self.sequence[slot];
        if packet.sequence != expected {
            return Err(ProtocolViolation::SequenceMismatch {
                state: self.state.as_str(),
                expected,
                actual: packet.sequence,
            });
        }
        self.sequence[slot] = expected.wrapping_add(1);
        Ok(())
    }
}
