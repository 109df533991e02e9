//! Summaries emitted by the series store and the poller.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The outcome of one `SeriesStore::merge` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Rows whose key was not present before the merge.
    pub inserted: usize,
    /// Rows that overwrote an existing key, including keys first inserted
    /// earlier in the same batch.
    pub updated: usize,
    /// Buckets removed by the retention bound after the batch was applied.
    pub evicted: usize,
}

/// A snapshot that could not be retrieved or produced no usable data during a
/// tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotFailure {
    /// The snapshot name as listed by the source.
    pub name: String,
    /// A human readable description of the failure.
    pub error: String,
}

/// The summary of one completed poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Monotonic tick sequence number, starting at 1.
    pub tick: u64,
    /// When the tick was started.
    pub started_at: DateTime<Utc>,
    /// The snapshot names listed by the source, in enumeration order.
    pub names: Vec<String>,
    /// Rows handed to the store in this tick's single merge batch.
    pub rows_merged: usize,
    /// The store's report for the merge batch.
    pub report: MergeReport,
    /// Rows rejected by the parser across all snapshots.
    pub parse_errors: usize,
    /// Snapshots that failed to fetch this tick, or whose every record was
    /// rejected by the parser.
    pub failures: Vec<SnapshotFailure>,
}
