//! This module defines the interface for listing and fetching snapshots.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Custom error type for snapshot source operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The set of snapshot names could not be enumerated. The whole tick is
    /// skipped and retried on the next one.
    #[error("Snapshot source unavailable: {0}")]
    SourceUnavailable(String),

    /// One snapshot could not be retrieved. Only that name is skipped.
    #[error("Failed to fetch snapshot '{name}': {reason}")]
    FetchFailed {
        /// The snapshot name.
        name: String,
        /// Why the fetch failed.
        reason: String,
    },
}

impl SourceError {
    pub(crate) fn fetch_failed(name: &str, reason: impl ToString) -> Self {
        Self::FetchFailed { name: name.to_string(), reason: reason.to_string() }
    }
}

/// A set of named tabular snapshots.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Enumerates the snapshot names, in a stable order.
    async fn list_names(&self) -> Result<Vec<String>, SourceError>;

    /// Fetches the raw text of one snapshot.
    async fn fetch(&self, name: &str) -> Result<String, SourceError>;
}
