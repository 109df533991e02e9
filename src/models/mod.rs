//! This module contains the data models shared across the ingestion pipeline.

mod bucket;
mod report;
mod row;

pub use bucket::BucketKey;
pub use report::{MergeReport, SnapshotFailure, TickSummary};
pub use row::{Row, SeriesPoint};
