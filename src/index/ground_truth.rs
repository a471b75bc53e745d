//! BTreeMap-backed ground truth
//!
//! `k -> {CompositeKey}` plus `CompositeKey -> k`. Lookups return the
//! maximal expected result set for a predicate before pagination.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use super::errors::{IndexError, IndexResult};
use crate::cases::Predicate;
use crate::dataset::CompositeKey;

/// Borrowed set of expected keys
pub type KeySet<'a> = BTreeSet<&'a CompositeKey>;

/// Expected results for every predicate the harness can issue
#[derive(Debug, Default, Clone)]
pub struct GroundTruthIndex {
    /// Buckets by indexed value; empty buckets are never stored
    buckets: BTreeMap<i64, BTreeSet<CompositeKey>>,
    /// Reverse mapping for order checks
    reverse: HashMap<CompositeKey, i64>,
}

impl GroundTruthIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key` was written with indexed value `k`.
    pub fn insert(&mut self, key: CompositeKey, k: i64) -> IndexResult<()> {
        if let Some(existing) = self.reverse.get(&key) {
            return Err(IndexError::duplicate_key(&key, *existing, k));
        }
        self.reverse.insert(key.clone(), k);
        self.buckets.entry(k).or_default().insert(key);
        Ok(())
    }

    /// Folds a worker's shard into this index.
    ///
    /// Shards cover disjoint id ranges, so any overlap is a generator bug.
    pub fn merge(&mut self, shard: GroundTruthIndex) -> IndexResult<()> {
        for (k, keys) in shard.buckets {
            for key in keys {
                self.insert(key, k)?;
            }
        }
        Ok(())
    }

    /// Keys whose `k` equals `k`
    pub fn lookup_eq(&self, k: i64) -> KeySet<'_> {
        self.buckets
            .get(&k)
            .map(|keys| keys.iter().collect())
            .unwrap_or_default()
    }

    /// Keys whose `k` lies in `[low, high)`. Empty when `high <= low`.
    pub fn lookup_range(&self, low: i64, high: i64) -> KeySet<'_> {
        if high <= low {
            return KeySet::new();
        }
        self.buckets
            .range((Bound::Included(low), Bound::Excluded(high)))
            .flat_map(|(_, keys)| keys.iter())
            .collect()
    }

    /// Keys whose `k` is any member of `list`
    pub fn lookup_in(&self, list: &[i64]) -> KeySet<'_> {
        let mut result = KeySet::new();
        for k in list {
            if let Some(keys) = self.buckets.get(k) {
                result.extend(keys.iter());
            }
        }
        result
    }

    /// Dispatches to the lookup matching the predicate shape
    pub fn expected_for(&self, predicate: &Predicate) -> KeySet<'_> {
        match predicate {
            Predicate::Equality(k) => self.lookup_eq(*k),
            Predicate::Range { low, high } => self.lookup_range(*low, *high),
            Predicate::Membership(list) => self.lookup_in(list),
        }
    }

    /// Ground-truth `k` for a key, if the key was ever generated
    pub fn k_of(&self, key: &CompositeKey) -> Option<i64> {
        self.reverse.get(key).copied()
    }

    /// Number of rows with this `k`
    pub fn count_eq(&self, k: i64) -> usize {
        self.buckets.get(&k).map_or(0, BTreeSet::len)
    }

    /// Number of non-empty buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total rows recorded
    pub fn row_count(&self) -> usize {
        self.reverse.len()
    }

    /// `(k, fan-out)` for every non-empty bucket, ascending by `k`
    pub fn bucket_sizes(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.buckets.iter().map(|(k, keys)| (*k, keys.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: i64) -> CompositeKey {
        CompositeKey::new(id, "AB")
    }

    fn sample() -> GroundTruthIndex {
        let mut index = GroundTruthIndex::new();
        index.insert(key(1), 3).unwrap();
        index.insert(key(2), 3).unwrap();
        index.insert(key(3), 4).unwrap();
        index.insert(key(4), 7).unwrap();
        index.insert(key(5), 9).unwrap();
        index
    }

    #[test]
    fn test_lookup_eq() {
        let index = sample();
        assert_eq!(index.lookup_eq(3).len(), 2);
        assert!(index.lookup_eq(5).is_empty());
        assert_eq!(index.count_eq(7), 1);
    }

    #[test]
    fn test_lookup_range_is_half_open() {
        let index = sample();
        let keys = index.lookup_range(3, 7);
        assert_eq!(keys.len(), 3);
        assert!(!keys.contains(&key(4)));

        assert!(index.lookup_range(7, 7).is_empty());
        assert!(index.lookup_range(9, 2).is_empty());
    }

    #[test]
    fn test_lookup_in_unions_buckets() {
        let index = sample();
        let keys = index.lookup_in(&[3, 4, 7, 100]);
        assert_eq!(keys.len(), 4);
        // Repeated members add nothing
        assert_eq!(index.lookup_in(&[3, 3]).len(), 2);
    }

    #[test]
    fn test_reverse_mapping() {
        let index = sample();
        assert_eq!(index.k_of(&key(4)), Some(7));
        assert_eq!(index.k_of(&key(99)), None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut index = sample();
        let err = index.insert(key(1), 8).unwrap_err();
        assert_eq!(err.code().code(), "PUSHDOWN_DUPLICATE_KEY");
        // The failed insert left no trace
        assert_eq!(index.count_eq(8), 0);
        assert_eq!(index.row_count(), 5);
    }

    #[test]
    fn test_merge_disjoint_shards() {
        let mut left = GroundTruthIndex::new();
        left.insert(key(1), 1).unwrap();
        let mut right = GroundTruthIndex::new();
        right.insert(key(2), 1).unwrap();
        right.insert(key(3), 2).unwrap();

        left.merge(right).unwrap();
        assert_eq!(left.row_count(), 3);
        assert_eq!(left.bucket_count(), 2);
        assert_eq!(left.bucket_sizes().collect::<Vec<_>>(), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn test_merge_overlapping_shards_fails() {
        let mut left = GroundTruthIndex::new();
        left.insert(key(1), 1).unwrap();
        let mut right = GroundTruthIndex::new();
        right.insert(key(1), 2).unwrap();
        assert!(left.merge(right).is_err());
    }

    #[test]
    fn test_expected_for_dispatch() {
        let index = sample();
        assert_eq!(index.expected_for(&Predicate::Equality(3)).len(), 2);
        assert_eq!(index.expected_for(&Predicate::Range { low: 4, high: 10 }).len(), 3);
        assert_eq!(index.expected_for(&Predicate::Membership(vec![4, 9])).len(), 2);
    }
}
