//! MySQL client/server protocol tracking.
//!
//! - [`Command`] - the 29 client command codes
//! - [`codec`] - response markers and length-coded integers
//! - [`ProtocolStateMachine`] - correlates commands with their responses
//! - [`Query`] / [`QuerySink`] - completed query records and their consumer

pub mod codec;
mod command;
mod machine;
mod query;

pub use codec::{LengthCoded, LengthCodedError};
pub use command::Command;
pub use machine::{MysqlPacket, ProtocolStateMachine, ProtocolViolation, SequenceMode, State};
pub use query::{Query, QueryOutcome, QuerySink};

/// Default MySQL server port.
pub const DEFAULT_SERVER_PORT: u16 = 3306;
