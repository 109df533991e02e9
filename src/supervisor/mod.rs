//! The Supervisor module manages the lifecycle of the countwatch service.
//!
//! The `SupervisorBuilder` wires the series store, the poller and the HTTP
//! server together. `Supervisor::run` spawns them next to a signal handler and
//! shuts everything down through one cancellation token when a signal arrives
//! or any supervised task fails.

mod builder;

use std::sync::Arc;

use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::{signal, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{AppConfig, ConfigValidationError},
    engine::{Poller, PollerHandle},
    http_client::HttpClientError,
    http_server::{self, ApiState},
    providers::SnapshotSource,
    store::SeriesStore,
};

/// Represents the set of errors that can occur during the supervisor's
/// operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// An error occurred due to an invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigValidationError),

    /// The HTTP client for the snapshot source could not be built.
    #[error("Snapshot source creation failed: {0}")]
    SourceCreation(#[from] HttpClientError),

    /// The HTTP server could not start or stopped with an error.
    #[error("HTTP server error: {0}")]
    Server(#[from] http_server::ServerError),

    /// The signal handler could not be installed.
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// The primary runtime manager for the application.
pub struct Supervisor {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// The series store fed by the poller.
    store: Arc<SeriesStore>,

    /// The poller. Taken when `run` spawns it.
    poller: Poller,

    /// A token used to signal a graceful shutdown to all supervised tasks.
    cancellation_token: CancellationToken,

    /// A set of all spawned tasks that the supervisor is actively managing.
    join_set: JoinSet<Result<(), SupervisorError>>,
}

impl Supervisor {
    /// Creates a new Supervisor with all its required components.
    ///
    /// This is typically called by the `SupervisorBuilder` after it has
    /// validated the configuration.
    pub fn new(
        config: AppConfig,
        source: Arc<dyn SnapshotSource>,
        store: Arc<SeriesStore>,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let poller = Poller::new(&config, source, Arc::clone(&store), cancellation_token.clone());
        Self {
            config: Arc::new(config),
            store,
            poller,
            cancellation_token,
            join_set: JoinSet::new(),
        }
    }

    /// Returns a new `SupervisorBuilder` instance.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// The series store.
    pub fn store(&self) -> Arc<SeriesStore> {
        Arc::clone(&self.store)
    }

    /// A handle to the poller.
    pub fn poller(&self) -> PollerHandle {
        self.poller.handle()
    }

    /// A token that shuts the supervisor down when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Starts the poller, the HTTP server and the signal handler and runs
    /// until shutdown.
    ///
    /// Returns the first error reported by a supervised task, if any.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        self.join_set.spawn(wait_for_signal(self.cancellation_token.clone()));

        if self.config.server.enabled {
            let state = ApiState { store: Arc::clone(&self.store), poller: self.poller.handle() };
            let config = Arc::clone(&self.config);
            let token = self.cancellation_token.clone();
            self.join_set.spawn(async move {
                http_server::run_server(&config.server, state, token).await.map_err(|e| {
                    tracing::error!(error = %e, "HTTP server failed.");
                    SupervisorError::from(e)
                })
            });
        }

        let handle = self.poller.handle();
        let poller = self.poller;
        self.join_set.spawn(async move {
            poller.run().await;
            Ok::<(), SupervisorError>(())
        });

        let mut first_error = None;
        loop {
            tokio::select! {
                maybe_result = self.join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(Ok(()))) => {}
                        Some(Ok(Err(e))) => {
                            tracing::error!(
                                error = %e,
                                "A supervised task failed. Initiating shutdown."
                            );
                            first_error.get_or_insert(e);
                            self.cancellation_token.cancel();
                        }
                        Some(Err(e)) => {
                            tracing::error!(
                                "A critical task failed: {:?}. Initiating shutdown.",
                                e
                            );
                            self.cancellation_token.cancel();
                        }
                        None => break,
                    }
                }
                _ = self.cancellation_token.cancelled() => break,
            }
        }

        let shutdown_timeout = self.config.shutdown_timeout;
        let drain = async {
            while let Some(result) = self.join_set.join_next().await {
                if let Ok(Err(e)) = result {
                    tracing::warn!(error = %e, "Task reported an error during shutdown.");
                }
            }
        };
        if tokio::time::timeout(shutdown_timeout, drain).await.is_err() {
            tracing::warn!(
                "Tasks did not finish within the timeout of {:?}. Aborting them.",
                shutdown_timeout
            );
            self.join_set.shutdown().await;
        } else {
            tracing::info!("All supervised tasks have completed.");
        }

        let stats = handle.metrics().snapshot().await;
        tracing::info!(
            buckets = self.store.len(),
            ticks_completed = stats.ticks_completed,
            ticks_failed = stats.ticks_failed,
            "Supervisor shutdown complete."
        );

        first_error.map_or(Ok(()), Err)
    }
}

/// Cancels `cancellation_token` on SIGINT or SIGTERM. Returns early if the
/// token is cancelled by someone else.
async fn wait_for_signal(cancellation_token: CancellationToken) -> Result<(), SupervisorError> {
    let ctrl_c = signal::ctrl_c();
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(SupervisorError::Signal)?;
    #[cfg(unix)]
    let terminate = terminate.recv();
    #[cfg(not(unix))]
    let terminate = std::future::pending::<Option<()>>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
        _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
        _ = cancellation_token.cancelled() => return Ok(()),
    }

    cancellation_token.cancel();
    Ok(())
}
