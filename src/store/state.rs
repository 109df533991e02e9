use std::collections::{BTreeMap, btree_map};

use crate::models::{BucketKey, Row};

/// One immutable, published version of the series.
///
/// Keys are unique and iterate in ascending order. The store never mutates a
/// published state; a merge builds the next one from a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesState {
    rows: BTreeMap<BucketKey, Row>,
}

impl SeriesState {
    /// Number of retained buckets.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no bucket is retained.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up the row stored for `key`.
    pub fn get(&self, key: &BucketKey) -> Option<&Row> {
        self.rows.get(key)
    }

    /// The oldest retained key.
    pub fn first_key(&self) -> Option<&BucketKey> {
        self.rows.keys().next()
    }

    /// The newest retained key.
    pub fn last_key(&self) -> Option<&BucketKey> {
        self.rows.keys().next_back()
    }

    /// Rows in ascending key order.
    pub fn rows(&self) -> btree_map::Values<'_, BucketKey, Row> {
        self.rows.values()
    }

    /// Inserts or overwrites the row for its key. Returns `true` if the key
    /// was new.
    pub(super) fn upsert(&mut self, row: Row) -> bool {
        self.rows.insert(row.key.clone(), row).is_none()
    }

    /// Drops the oldest keys until at most `max` remain. Returns how many
    /// were dropped.
    pub(super) fn evict_to(&mut self, max: usize) -> usize {
        let mut evicted = 0;
        while self.rows.len() > max {
            self.rows.pop_first();
            evicted += 1;
        }
        evicted
    }
}
