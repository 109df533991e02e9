use std::sync::Arc;

use tokio::sync::RwLock;

use super::TickOutcome;
use crate::models::TickSummary;

/// Counters describing the poller's activity since start-up.
#[derive(Debug, Clone)]
pub struct PollerStats {
    /// The time the poller was created.
    pub start_time: tokio::time::Instant,
    /// Ticks that listed the source and merged a batch.
    pub ticks_completed: u64,
    /// Ticks dropped because another tick was still running.
    pub ticks_skipped: u64,
    /// Ticks that could not list the source.
    pub ticks_failed: u64,
    /// Rows rejected by the parser across all ticks.
    pub parse_errors_total: u64,
    /// The most recent completed tick.
    pub last_tick: Option<TickSummary>,
    /// The most recent listing failure.
    pub last_error: Option<String>,
}

impl Default for PollerStats {
    fn default() -> Self {
        Self {
            start_time: tokio::time::Instant::now(),
            ticks_completed: 0,
            ticks_skipped: 0,
            ticks_failed: 0,
            parse_errors_total: 0,
            last_tick: None,
            last_error: None,
        }
    }
}

/// Shared poller metrics for the HTTP server.
#[derive(Debug, Clone, Default)]
pub struct PollerMetrics {
    /// Shared stats.
    pub stats: Arc<RwLock<PollerStats>>,
}

impl PollerMetrics {
    /// Folds one tick outcome into the counters.
    pub async fn record(&self, outcome: &TickOutcome) {
        let mut stats = self.stats.write().await;
        match outcome {
            TickOutcome::Completed(summary) => {
                stats.ticks_completed += 1;
                stats.parse_errors_total += summary.parse_errors as u64;
                stats.last_tick = Some(summary.clone());
            }
            TickOutcome::Skipped => stats.ticks_skipped += 1,
            TickOutcome::SourceUnavailable(e) => {
                stats.ticks_failed += 1;
                stats.last_error = Some(e.to_string());
            }
            TickOutcome::Cancelled => {}
        }
    }

    /// A copy of the current counters.
    pub async fn snapshot(&self) -> PollerStats {
        self.stats.read().await.clone()
    }
}
