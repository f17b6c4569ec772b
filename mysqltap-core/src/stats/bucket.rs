//! Keyed sample multisets.

use std::collections::HashMap;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{decode_snapshot, encode_snapshot};
use crate::error::SnapshotError;

/// Summary of one key's samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub sum: i64,
    pub mean: f64,
    pub count: usize,
    /// Element at index `count / 2` of the ascending samples. For an even
    /// count this is the upper of the two middle elements.
    pub median: i64,
}

impl Aggregate {
    fn of(samples: &[i64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let sum: i64 = sorted.iter().sum();
        let count = sorted.len();
        Some(Self {
            sum,
            mean: sum as f64 / count as f64,
            count,
            median: sorted[count / 2],
        })
    }
}

/// Map from key to every sample recorded for it.
///
/// Samples are kept, not folded, so buckets built over disjoint parts of a
/// capture merge into exactly the bucket a single pass would have built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    transparent,
    bound(
        serialize = "K: Serialize + Eq + Hash",
        deserialize = "K: Deserialize<'de> + Eq + Hash"
    )
)]
pub struct StatBucket<K> {
    samples: HashMap<K, Vec<i64>>,
}

impl<K: Eq + Hash> PartialEq for StatBucket<K> {
    fn eq(&self, other: &Self) -> bool {
        self.samples == other.samples
    }
}

impl<K: Eq + Hash> Eq for StatBucket<K> {}

impl<K> Default for StatBucket<K> {
    fn default() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> StatBucket<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, sample: i64) {
        self.samples.entry(key).or_default().push(sample);
    }

    /// Append every sample of `other` to this bucket.
    pub fn merge(&mut self, other: StatBucket<K>) {
        for (key, samples) in other.samples {
            self.samples.entry(key).or_default().extend(samples);
        }
    }

    pub fn aggregate(&self, key: &K) -> Option<Aggregate> {
        self.samples.get(key).and_then(|s| Aggregate::of(s))
    }

    pub fn samples(&self, key: &K) -> Option<&[i64]> {
        self.samples.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.samples.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.samples.keys()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<K: Eq + Hash + Ord> StatBucket<K> {
    /// Every key with its aggregate, by descending sum then ascending key.
    pub fn ranked(&self) -> Vec<(&K, Aggregate)> {
        let mut ranked: Vec<(&K, Aggregate)> = self
            .samples
            .iter()
            .filter_map(|(key, samples)| Aggregate::of(samples).map(|agg| (key, agg)))
            .collect();
        ranked.sort_by(|(ka, a), (kb, b)| b.sum.cmp(&a.sum).then_with(|| ka.cmp(kb)));
        ranked
    }
}

impl<K: Eq + Hash + Serialize + DeserializeOwned> StatBucket<K> {
    /// Versioned binary snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_snapshot(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        decode_snapshot(bytes)
    }

    /// Decode a snapshot and merge it into this bucket.
    pub fn merge_bytes(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let other = Self::from_bytes(bytes)?;
        self.merge(other);
        Ok(())
    }
}

impl<K: Eq + Hash> FromIterator<(K, i64)> for StatBucket<K> {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        let mut bucket = Self::new();
        bucket.extend(iter);
        bucket
    }
}

impl<K: Eq + Hash> Extend<(K, i64)> for StatBucket<K> {
    fn extend<I: IntoIterator<Item = (K, i64)>>(&mut self, iter: I) {
        for (key, sample) in iter {
            self.insert(key, sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SNAPSHOT_VERSION;

    fn bucket(samples: &[(&'static str, i64)]) -> StatBucket<&'static str> {
        samples.iter().copied().collect()
    }

    #[test]
    fn test_merge_two_partial_buckets() {
        let a = bucket(&[("foo", 2), ("foo", 5)]);
        let b = bucket(&[("foo", 8)]);

        let mut c = StatBucket::new();
        c.merge(a);
        c.merge(b);

        assert_eq!(
            c.ranked(),
            vec![(
                &"foo",
                Aggregate {
                    sum: 15,
                    mean: 5.0,
                    count: 3,
                    median: 5
                }
            )]
        );
    }

    #[test]
    fn test_median_takes_upper_middle() {
        let b = bucket(&[("k", 10), ("k", 1), ("k", 4), ("k", 3)]);
        let agg = b.aggregate(&"k").unwrap();
        assert_eq!(agg.median, 4);
        assert_eq!(agg.count, 4);
        assert_eq!(agg.mean, 4.5);

        // Aggregation does not reorder the stored samples
        assert_eq!(b.samples(&"k").unwrap(), &[10, 1, 4, 3]);
    }

    #[test]
    fn test_single_sample() {
        let b = bucket(&[("k", -7)]);
        assert_eq!(
            b.aggregate(&"k"),
            Some(Aggregate {
                sum: -7,
                mean: -7.0,
                count: 1,
                median: -7
            })
        );
        assert_eq!(b.aggregate(&"missing"), None);
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let parts = [
            bucket(&[("a", 1), ("b", 9)]),
            bucket(&[("a", 4), ("c", 2)]),
            bucket(&[("b", 3), ("a", 7), ("a", 2)]),
        ];

        // (p0 + p1) + p2
        let mut left = parts[0].clone();
        left.merge(parts[1].clone());
        left.merge(parts[2].clone());

        // p2 + (p1 + p0)
        let mut inner = parts[1].clone();
        inner.merge(parts[0].clone());
        let mut right = parts[2].clone();
        right.merge(inner);

        assert_eq!(left.ranked(), right.ranked());
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn test_merging_empty_is_identity() {
        let mut b = bucket(&[("a", 1), ("a", 2)]);
        let before = b.ranked().into_iter().map(|(k, a)| (*k, a)).collect::<Vec<_>>();
        b.merge(StatBucket::new());
        let after = b.ranked().into_iter().map(|(k, a)| (*k, a)).collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    #[test]
    fn test_ranked_ties_break_on_key() {
        let b = bucket(&[("zeta", 5), ("alpha", 5), ("mid", 2), ("beta", 5), ("top", 40)]);
        let keys: Vec<&str> = b.ranked().into_iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["top", "alpha", "beta", "zeta", "mid"]);
    }

    #[test]
    fn test_snapshot_merge() {
        let a: StatBucket<String> = [("foo".to_string(), 2), ("foo".to_string(), 5)]
            .into_iter()
            .collect();
        let b: StatBucket<String> = [("foo".to_string(), 8)].into_iter().collect();

        let mut c = StatBucket::new();
        c.merge_bytes(&a.to_bytes().unwrap()).unwrap();
        c.merge_bytes(&b.to_bytes().unwrap()).unwrap();

        let agg = c.aggregate(&"foo".to_string()).unwrap();
        assert_eq!((agg.sum, agg.count, agg.median), (15, 3, 5));
    }

    #[test]
    fn test_snapshot_rejects_other_version() {
        let mut bytes = StatBucket::<String>::new().to_bytes().unwrap();
        bytes[..2].copy_from_slice(&(SNAPSHOT_VERSION + 1).to_le_bytes());

        let err = StatBucket::<String>::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion { found, expected }
                if found == SNAPSHOT_VERSION + 1 && expected == SNAPSHOT_VERSION
        ));
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(matches!(
            StatBucket::<String>::from_bytes(&[1]),
            Err(SnapshotError::Malformed(_))
        ));

        let one: StatBucket<String> = [("a".to_string(), 1)].into_iter().collect();
        let mut truncated = one.to_bytes().unwrap();
        truncated.truncate(truncated.len() - 3);
        assert!(matches!(
            StatBucket::<String>::from_bytes(&truncated),
            Err(SnapshotError::Malformed(_))
        ));
    }
}
