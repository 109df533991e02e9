//! Snapshot sources: where the poller lists and fetches snapshots from.

mod directory;
mod http;
mod traits;

use std::sync::Arc;

pub use directory::DirectorySnapshotSource;
pub use http::HttpSnapshotSource;
#[cfg(test)]
pub use traits::MockSnapshotSource;
pub use traits::{SnapshotSource, SourceError};

use crate::{
    config::{AppConfig, SourceConfig},
    http_client::{HttpClientError, create_http_client},
};

/// Builds the snapshot source described by the configuration.
pub fn create_source(config: &AppConfig) -> Result<Arc<dyn SnapshotSource>, HttpClientError> {
    let source: Arc<dyn SnapshotSource> = match &config.source {
        SourceConfig::Http { base_url, listing_url, names } => {
            let client = create_http_client(&config.http_base_config, &config.http_retry_config)?;
            match listing_url {
                Some(listing_url) => Arc::new(HttpSnapshotSource::with_listing(
                    client,
                    base_url.clone(),
                    listing_url.clone(),
                )),
                None => Arc::new(HttpSnapshotSource::with_names(
                    client,
                    base_url.clone(),
                    names.clone(),
                )),
            }
        }
        SourceConfig::Directory { path, extension } => {
            Arc::new(DirectorySnapshotSource::new(path.clone(), extension.clone()))
        }
    };
    Ok(source)
}
