//! This module defines the `Row` and `SeriesPoint` structures.

use serde::Serialize;

use super::BucketKey;

/// One validated bucket record produced by the row parser.
///
/// `count` is unsigned, so a negative or fractional count can never reach the
/// series store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// The reporting interval this row describes.
    pub key: BucketKey,
    /// The number of requests observed in the interval.
    pub count: u64,
    /// Whether the upstream detector flagged the interval as anomalous.
    pub is_anomaly: bool,
}

impl Row {
    /// Creates a new `Row`.
    pub fn new(key: impl Into<BucketKey>, count: u64, is_anomaly: bool) -> Self {
        Self { key: key.into(), count, is_anomaly }
    }

    /// Projects the row to the `(key, count)` pair consumed by renderers.
    pub fn point(&self) -> SeriesPoint {
        SeriesPoint { key: self.key.clone(), count: self.count }
    }
}

/// A `(key, count)` pair, the element of both published views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    /// The bucket key.
    pub key: BucketKey,
    /// The bucket's request count.
    pub count: u64,
}

impl SeriesPoint {
    /// Creates a new `SeriesPoint`.
    pub fn new(key: impl Into<BucketKey>, count: u64) -> Self {
        Self { key: key.into(), count }
    }
}
