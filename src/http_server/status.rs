//! Represents the `/status` endpoint handler and response structure.
//! Provides poller state and ingestion counters.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::{
    engine::PollerState,
    models::{BucketKey, TickSummary},
};

/// Represents the response from the `/status` endpoint.
#[derive(Debug, Serialize, Clone)]
pub struct StatusResponse {
    /// The version of the application.
    pub version: String,
    /// The poller's lifecycle state.
    pub poller_state: PollerState,
    /// The uptime of the poller in seconds.
    pub uptime_secs: u64,
    /// Number of retained buckets.
    pub buckets: usize,
    /// The retention bound.
    pub max_buckets: usize,
    /// The oldest retained key.
    pub first_key: Option<BucketKey>,
    /// The newest retained key.
    pub last_key: Option<BucketKey>,
    /// Ticks that merged a batch.
    pub ticks_completed: u64,
    /// Ticks dropped because another was running.
    pub ticks_skipped: u64,
    /// Ticks that could not list the source.
    pub ticks_failed: u64,
    /// Rows rejected by the parser since start-up.
    pub parse_errors_total: u64,
    /// The most recent listing failure.
    pub last_error: Option<String>,
    /// The most recent completed tick.
    pub last_tick: Option<TickSummary>,
}

/// Retrieves poller status and series metrics.
pub async fn status(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.poller.metrics().snapshot().await;
    let series = state.store.snapshot();
    let response = StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        poller_state: state.poller.state(),
        uptime_secs: stats.start_time.elapsed().as_secs(),
        buckets: series.len(),
        max_buckets: state.store.max_buckets().get(),
        first_key: series.first_key().cloned(),
        last_key: series.last_key().cloned(),
        ticks_completed: stats.ticks_completed,
        ticks_skipped: stats.ticks_skipped,
        ticks_failed: stats.ticks_failed,
        parse_errors_total: stats.parse_errors_total,
        last_error: stats.last_error,
        last_tick: stats.last_tick,
    };
    Ok((StatusCode::OK, Json(response)))
}
