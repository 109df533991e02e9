//! Defines the custom `ApiError` type for the HTTP server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

/// A custom error type for the API that can be converted into an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// The poller is stopped and cannot accept work.
    ServiceUnavailable(String),
}

/// Implements the conversion from `ApiError` into an `axum` response.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::ServiceUnavailable(message) => {
                tracing::warn!(%message, "Rejecting request.");
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": message }))
            }
        };

        (status, Json(body)).into_response()
    }
}
