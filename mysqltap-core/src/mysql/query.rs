//! Completed query records and their consumers.

use serde::{Deserialize, Serialize};

use super::Command;

/// How the server answered a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOutcome {
    /// OK packet.
    Ok { affected_rows: Option<u64> },
    /// Error packet.
    Error { code: Option<u16> },
    /// Result set terminated by EOF.
    ResultSet { columns: u64 },
}

impl QueryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOutcome::Ok { .. } => "ok",
            QueryOutcome::Error { .. } => "error",
            QueryOutcome::ResultSet { .. } => "result_set",
        }
    }
}

/// A query whose full response cycle was observed.
///
/// Timestamps are capture times in microseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Table-assigned id of the connection that carried the query.
    pub connection_id: u64,
    pub command: Command,
    pub sql: String,
    /// Time of the command packet.
    pub issued_at: i64,
    /// Time of the first response packet.
    pub first_response_at: i64,
    /// Time of the first result row, if any rows were returned.
    pub first_row_at: Option<i64>,
    /// Time of the last result row, if any rows were returned.
    pub last_row_at: Option<i64>,
    /// Time of the packet that ended the response (OK, error or final EOF).
    pub completed_at: i64,
    pub rows: u64,
    pub outcome: QueryOutcome,
}

impl Query {
    /// Time from issue to the first result row, or to completion when the
    /// response carried no rows.
    pub fn latency_us(&self) -> i64 {
        self.first_row_at.unwrap_or(self.completed_at) - self.issued_at
    }

    /// Time from issue to the first response packet.
    pub fn response_delay_us(&self) -> i64 {
        self.first_response_at - self.issued_at
    }

    /// Time from issue to the end of the response.
    pub fn duration_us(&self) -> i64 {
        self.completed_at - self.issued_at
    }
}

/// Consumer of completed queries.
pub trait QuerySink {
    fn on_query(&mut self, query: Query);
}

impl<F: FnMut(Query)> QuerySink for F {
    fn on_query(&mut self, query: Query) {
        self(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Query {
        Query {
            connection_id: 1,
            command: Command::Query,
            sql: "SELECT 1".to_string(),
            issued_at: 1_000,
            first_response_at: 1_250,
            first_row_at: Some(1_400),
            last_row_at: Some(1_900),
            completed_at: 2_000,
            rows: 3,
            outcome: QueryOutcome::ResultSet { columns: 1 },
        }
    }

    #[test]
    fn test_timings() {
        let query = sample();
        assert_eq!(query.latency_us(), 400);
        assert_eq!(query.response_delay_us(), 250);
        assert_eq!(query.duration_us(), 1_000);
    }

    #[test]
    fn test_latency_without_rows() {
        let query = Query {
            first_row_at: None,
            last_row_at: None,
            rows: 0,
            outcome: QueryOutcome::Ok {
                affected_rows: Some(0),
            },
            ..sample()
        };
        assert_eq!(query.latency_us(), 1_000);
        assert_eq!(query.outcome.as_str(), "ok");
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |q: Query| seen.push(q.sql);
            sink.on_query(sample());
            sink.on_query(sample());
        }
        assert_eq!(seen, vec!["SELECT 1", "SELECT 1"]);
    }
}
