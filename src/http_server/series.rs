//! Handlers publishing the two series views and triggering refreshes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::{ApiError, ApiState};

/// Every retained bucket as `[{"key", "count"}, ...]`, ascending by key.
pub async fn get_series(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.count_series())
}

/// The anomalous buckets as `[{"key", "count"}, ...]`, ascending by key.
pub async fn get_anomalies(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.anomaly_overlay())
}

/// Asks the poller for an immediate tick.
///
/// `202` means the request was queued, not that it ran. A kick that reaches
/// the poller while a tick is running is skipped like any overlapping tick.
pub async fn refresh(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    if !state.poller.kick() {
        return Err(ApiError::ServiceUnavailable("Poller is stopped".to_string()));
    }
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}
