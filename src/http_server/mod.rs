//! HTTP server module
//!
//! A small read-only JSON API over the series store, plus an endpoint that
//! triggers an immediate poll.

mod error;
mod series;
mod status;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
pub use error::ApiError;
use serde_json::json;
pub use status::StatusResponse;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{config::ServerConfig, engine::PollerHandle, store::SeriesStore};

/// Errors that prevent the HTTP server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured listen address is not a socket address.
    #[error("Invalid server.listen_address '{0}'")]
    InvalidAddress(String),

    /// The listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The series being published.
    pub store: Arc<SeriesStore>,
    /// The poller feeding the store.
    pub poller: PollerHandle,
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Builds the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/series", get(series::get_series))
        .route("/anomalies", get(series::get_anomalies))
        .route("/status", get(status::status))
        .route("/refresh", post(series::refresh))
        .with_state(state)
}

/// Runs the HTTP server until `cancellation_token` is cancelled.
pub async fn run_server(
    config: &ServerConfig,
    state: ApiState,
    cancellation_token: CancellationToken,
) -> Result<(), ServerError> {
    let addr: SocketAddr = config
        .listen_address
        .parse()
        .map_err(|_| ServerError::InvalidAddress(config.listen_address.clone()))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(%addr, "HTTP server listening.");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(cancellation_token.cancelled_owned())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("HTTP server has shut down.");
    Ok(())
}
