//! Query statistics grouped by statement shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{decode_snapshot, encode_snapshot, Aggregate, StatBucket};
use crate::error::SnapshotError;
use crate::mysql::{Query, QueryOutcome, QuerySink};
use crate::sql::ShapeKey;

/// One line of the shape report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub shape: String,
    /// First statement text seen with this shape.
    pub example: String,
    pub count: usize,
    pub errors: u64,
    pub total_latency_us: i64,
    pub mean_latency_us: f64,
    pub median_latency_us: i64,
    pub total_rows: i64,
    pub mean_rows: f64,
    pub median_rows: i64,
}

impl ReportRow {
    fn new(
        key: &ShapeKey,
        example: &str,
        latency: Aggregate,
        rows: Aggregate,
        errors: u64,
    ) -> Self {
        Self {
            shape: key.render(),
            example: example.to_string(),
            count: latency.count,
            errors,
            total_latency_us: latency.sum,
            mean_latency_us: latency.mean,
            median_latency_us: latency.median,
            total_rows: rows.sum,
            mean_rows: rows.mean,
            median_rows: rows.median,
        }
    }
}

/// Latency and row-count samples per statement shape.
///
/// Each recorded query adds its [`Query::latency_us`] to the latency bucket
/// and its row count to the rows bucket, both under the shape of its SQL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryStats {
    latency: StatBucket<ShapeKey>,
    rows: StatBucket<ShapeKey>,
    examples: HashMap<ShapeKey, String>,
    errors: HashMap<ShapeKey, u64>,
    queries: u64,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: &Query) {
        let shape = ShapeKey::of(&query.sql);

        self.latency.insert(shape.clone(), query.latency_us());
        let rows = i64::try_from(query.rows).unwrap_or(i64::MAX);
        self.rows.insert(shape.clone(), rows);
        if matches!(query.outcome, QueryOutcome::Error { .. }) {
            *self.errors.entry(shape.clone()).or_default() += 1;
        }
        self.examples.entry(shape).or_insert_with(|| query.sql.clone());
        self.queries += 1;
    }

    /// Number of queries recorded, including merged snapshots.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Number of distinct shapes.
    pub fn shapes(&self) -> usize {
        self.latency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries == 0
    }

    pub fn latency(&self) -> &StatBucket<ShapeKey> {
        &self.latency
    }

    pub fn rows(&self) -> &StatBucket<ShapeKey> {
        &self.rows
    }

    pub fn merge(&mut self, other: QueryStats) {
        self.latency.merge(other.latency);
        self.rows.merge(other.rows);
        for (shape, sql) in other.examples {
            self.examples.entry(shape).or_insert(sql);
        }
        for (shape, n) in other.errors {
            *self.errors.entry(shape).or_default() += n;
        }
        self.queries += other.queries;
    }

    /// Report rows by descending total latency, ties broken by shape.
    pub fn ranked(&self) -> Vec<ReportRow> {
        self.latency
            .ranked()
            .into_iter()
            .map(|(shape, latency)| {
                let rows = self.rows.aggregate(shape).unwrap_or_default();
                let example = self.examples.get(shape).map_or("", String::as_str);
                let errors = self.errors.get(shape).copied().unwrap_or(0);
                ReportRow::new(shape, example, latency, rows, errors)
            })
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_snapshot(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        decode_snapshot(bytes)
    }

    pub fn merge_bytes(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let other = Self::from_bytes(bytes)?;
        self.merge(other);
        Ok(())
    }
}

impl QuerySink for QueryStats {
    fn on_query(&mut self, query: Query) {
        self.record(&query);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mysql::Command;

    fn query(sql: &str, issued_at: i64, first_row_at: Option<i64>, rows: u64) -> Query {
        let completed_at = first_row_at.unwrap_or(issued_at) + 50;
        Query {
            connection_id: 1,
            command: Command::Query,
            sql: sql.to_string(),
            issued_at,
            first_response_at: issued_at + 10,
            first_row_at,
            last_row_at: first_row_at,
            completed_at,
            rows,
            outcome: if rows > 0 {
                QueryOutcome::ResultSet { columns: 1 }
            } else {
                QueryOutcome::Ok {
                    affected_rows: Some(0),
                }
            },
        }
    }

    #[test]
    fn test_groups_by_shape() {
        let mut stats = QueryStats::new();
        stats.record(&query("SELECT * FROM t WHERE id = 39", 0, Some(100), 1));
        stats.record(&query("SELECT * FROM t WHERE id = 104", 0, Some(300), 1));
        stats.record(&query("SELECT * FROM u WHERE id = 1", 0, Some(50), 4));

        assert_eq!(stats.queries(), 3);
        assert_eq!(stats.shapes(), 2);

        let report = stats.ranked();
        assert_eq!(report[0].shape, "SELECT * FROM t WHERE id = ?");
        assert_eq!(report[0].example, "SELECT * FROM t WHERE id = 39");
        assert_eq!(report[0].count, 2);
        assert_eq!(report[0].total_latency_us, 400);
        assert_eq!(report[0].mean_latency_us, 200.0);
        assert_eq!(report[0].median_latency_us, 300);
        assert_eq!(report[0].total_rows, 2);

        assert_eq!(report[1].shape, "SELECT * FROM u WHERE id = ?");
        assert_eq!(report[1].total_rows, 4);
        assert_eq!(report[1].errors, 0);
    }

    #[test]
    fn test_latency_falls_back_to_completion() {
        let mut stats = QueryStats::new();
        stats.record(&query("UPDATE t SET a = 1", 1_000, None, 0));

        let report = stats.ranked();
        assert_eq!(report[0].total_latency_us, 50);
        assert_eq!(report[0].total_rows, 0);
    }

    #[test]
    fn test_counts_errors() {
        let mut stats = QueryStats::new();
        let mut failed = query("SELECT nope FROM t", 0, None, 0);
        failed.outcome = QueryOutcome::Error { code: Some(1054) };
        stats.on_query(failed.clone());
        stats.on_query(failed);
        stats.on_query(query("SELECT nope FROM t", 0, Some(5), 1));

        let report = stats.ranked();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].count, 3);
        assert_eq!(report[0].errors, 2);
    }

    #[test]
    fn test_merged_snapshots_match_single_pass() {
        let all = [
            query("SELECT a FROM t WHERE id IN (1, 2)", 0, Some(10), 2),
            query("SELECT a FROM t WHERE id IN (3)", 0, Some(30), 1),
            query("DELETE FROM t WHERE id = 5", 0, None, 0),
            query("SELECT a FROM t WHERE id IN (9, 9, 9)", 0, Some(20), 3),
        ];

        let mut single = QueryStats::new();
        for q in &all {
            single.record(q);
        }

        let mut left = QueryStats::new();
        let mut right = QueryStats::new();
        for (i, q) in all.iter().enumerate() {
            if i % 2 == 0 {
                left.record(q);
            } else {
                right.record(q);
            }
        }

        let mut merged = QueryStats::new();
        merged.merge_bytes(&right.to_bytes().unwrap()).unwrap();
        merged.merge_bytes(&left.to_bytes().unwrap()).unwrap();

        assert_eq!(merged.queries(), single.queries());
        let strip = |rows: Vec<ReportRow>| {
            rows.into_iter()
                .map(|r| (r.shape, r.count, r.total_latency_us, r.median_latency_us, r.total_rows))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(merged.ranked()), strip(single.ranked()));
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(QueryStats::from_bytes(b"not a snapshot").is_err());
    }
}
