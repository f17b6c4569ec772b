//! Client command codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Command selected by the first body byte of a client command packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    Sleep = 0,
    Quit = 1,
    InitDb = 2,
    Query = 3,
    FieldList = 4,
    CreateDb = 5,
    DropDb = 6,
    Refresh = 7,
    Shutdown = 8,
    Statistics = 9,
    ProcessInfo = 10,
    Connect = 11,
    ProcessKill = 12,
    Debug = 13,
    Ping = 14,
    Time = 15,
    DelayedInsert = 16,
    ChangeUser = 17,
    BinlogDump = 18,
    TableDump = 19,
    ConnectOut = 20,
    RegisterSlave = 21,
    StmtPrepare = 22,
    StmtExecute = 23,
    StmtSendLongData = 24,
    StmtClose = 25,
    StmtReset = 26,
    SetOption = 27,
    StmtFetch = 28,
}

const COMMANDS: [Command; 29] = [
    Command::Sleep,
    Command::Quit,
    Command::InitDb,
    Command::Query,
    Command::FieldList,
    Command::CreateDb,
    Command::DropDb,
    Command::Refresh,
    Command::Shutdown,
    Command::Statistics,
    Command::ProcessInfo,
    Command::Connect,
    Command::ProcessKill,
    Command::Debug,
    Command::Ping,
    Command::Time,
    Command::DelayedInsert,
    Command::ChangeUser,
    Command::BinlogDump,
    Command::TableDump,
    Command::ConnectOut,
    Command::RegisterSlave,
    Command::StmtPrepare,
    Command::StmtExecute,
    Command::StmtSendLongData,
    Command::StmtClose,
    Command::StmtReset,
    Command::SetOption,
    Command::StmtFetch,
];

impl Command {
    /// Look up a command by its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        COMMANDS.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Sleep => "COM_SLEEP",
            Command::Quit => "COM_QUIT",
            Command::InitDb => "COM_INIT_DB",
            Command::Query => "COM_QUERY",
            Command::FieldList => "COM_FIELD_LIST",
            Command::CreateDb => "COM_CREATE_DB",
            Command::DropDb => "COM_DROP_DB",
            Command::Refresh => "COM_REFRESH",
            Command::Shutdown => "COM_SHUTDOWN",
            Command::Statistics => "COM_STATISTICS",
            Command::ProcessInfo => "COM_PROCESS_INFO",
            Command::Connect => "COM_CONNECT",
            Command::ProcessKill => "COM_PROCESS_KILL",
            Command::Debug => "COM_DEBUG",
            Command::Ping => "COM_PING",
            Command::Time => "COM_TIME",
            Command::DelayedInsert => "COM_DELAYED_INSERT",
            Command::ChangeUser => "COM_CHANGE_USER",
            Command::BinlogDump => "COM_BINLOG_DUMP",
            Command::TableDump => "COM_TABLE_DUMP",
            Command::ConnectOut => "COM_CONNECT_OUT",
            Command::RegisterSlave => "COM_REGISTER_SLAVE",
            Command::StmtPrepare => "COM_STMT_PREPARE",
            Command::StmtExecute => "COM_STMT_EXECUTE",
            Command::StmtSendLongData => "COM_STMT_SEND_LONG_DATA",
            Command::StmtClose => "COM_STMT_CLOSE",
            Command::StmtReset => "COM_STMT_RESET",
            Command::SetOption => "COM_SET_OPTION",
            Command::StmtFetch => "COM_STMT_FETCH",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_table_position() {
        for code in 0..29u8 {
            let command = Command::from_code(code).unwrap();
            assert_eq!(command.code(), code);
        }
    }

    #[test]
    fn test_known_commands() {
        assert_eq!(Command::from_code(3), Some(Command::Query));
        assert_eq!(Command::from_code(3).unwrap().as_str(), "COM_QUERY");
        assert_eq!(Command::from_code(0).unwrap().to_string(), "COM_SLEEP");
        assert_eq!(Command::from_code(28), Some(Command::StmtFetch));
    }

    #[test]
    fn test_unknown_commands() {
        assert_eq!(Command::from_code(29), None);
        assert_eq!(Command::try_from(0xff), Err(0xff));
    }
}
