//! Per-shape statistics.
//!
//! [`StatBucket`] keeps every sample so that buckets built by independent
//! workers can be merged in any order. [`QueryStats`] pairs a latency bucket
//! with a row-count bucket and plugs into the connection table as a
//! [`QuerySink`](crate::mysql::QuerySink).

mod bucket;
mod report;

pub use bucket::{Aggregate, StatBucket};
pub use report::{QueryStats, ReportRow};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SnapshotError;

/// Version stamped at the front of every snapshot.
pub const SNAPSHOT_VERSION: u16 = 1;

fn encode_snapshot<T: Serialize>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serialize(&(SNAPSHOT_VERSION, value))?)
}

fn decode_snapshot<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SnapshotError> {
    let found: u16 = bincode::deserialize(bytes)?;
    if found != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found,
            expected: SNAPSHOT_VERSION,
        });
    }

    let (_, value): (u16, T) = bincode::deserialize(bytes)?;
    Ok(value)
}
