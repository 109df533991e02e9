//! The poller drives ingestion: on a fixed cadence it lists the snapshot
//! source, fetches and parses every snapshot and merges the rows into the
//! series store.

mod metrics;
mod poller;

pub use metrics::{PollerMetrics, PollerStats};
pub use poller::{Poller, PollerHandle, PollerState, TickOutcome};
