//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use super::{Supervisor, SupervisorError};
use crate::{
    config::AppConfig,
    providers::{SnapshotSource, create_source},
    store::SeriesStore,
};

/// A builder for creating a `Supervisor` instance.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    source: Option<Arc<dyn SnapshotSource>>,
}

impl SupervisorBuilder {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the snapshot source. Without one, the source is built from
    /// the configuration.
    pub fn source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Validates the configuration and wires the store, poller and server.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        config.validate()?;
        let store = Arc::new(SeriesStore::new(config.max_buckets()?));

        let source = match self.source {
            Some(source) => source,
            None => create_source(&config)?,
        };
        tracing::debug!(source = ?config.source, "Snapshot source ready.");

        Ok(Supervisor::new(config, source, store))
    }
}
