use std::fmt;

/// Direction of data flow in a MySQL connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server.
    ToServer,
    /// Server to client.
    FromServer,
}

impl Direction {
    /// Classify a segment by its destination port.
    ///
    /// Only a destination equal to the server port counts as client to
    /// server. Everything else is treated as server to client.
    pub fn from_destination_port(destination_port: u16, server_port: u16) -> Self {
        if destination_port == server_port {
            Direction::ToServer
        } else {
            Direction::FromServer
        }
    }

    /// Return a string representation of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToServer => "to_server",
            Direction::FromServer => "from_server",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
