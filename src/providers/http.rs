//! Snapshots served over HTTP.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use super::traits::{SnapshotSource, SourceError};

/// How snapshot names are discovered.
#[derive(Debug, Clone)]
enum Listing {
    /// A JSON array of names served at this URL.
    Endpoint(Url),
    /// A fixed list of names.
    Fixed(Vec<String>),
}

/// A `SnapshotSource` that fetches each snapshot relative to a base URL.
pub struct HttpSnapshotSource {
    client: ClientWithMiddleware,
    base_url: Url,
    listing: Listing,
}

impl HttpSnapshotSource {
    /// Creates a source that discovers names from `listing_url`.
    pub fn with_listing(client: ClientWithMiddleware, base_url: Url, listing_url: Url) -> Self {
        Self { client, base_url, listing: Listing::Endpoint(listing_url) }
    }

    /// Creates a source over a fixed set of names.
    pub fn with_names(client: ClientWithMiddleware, base_url: Url, names: Vec<String>) -> Self {
        Self { client, base_url, listing: Listing::Fixed(names) }
    }

    /// Resolves `name` against the base URL. Only a single plain path
    /// segment is accepted, so a listed name can never leave the base
    /// directory or point at another host.
    fn snapshot_url(&self, name: &str) -> Result<Url, SourceError> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', ':', '?', '#', '%']);
        if !plain {
            return Err(SourceError::fetch_failed(name, "name is not a plain path segment"));
        }
        self.base_url.join(name).map_err(|e| SourceError::fetch_failed(name, e))
    }

    async fn get_text(&self, url: Url) -> Result<String, String> {
        let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        let response = response.error_for_status().map_err(|e| e.to_string())?;
        response.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn list_names(&self) -> Result<Vec<String>, SourceError> {
        let url = match &self.listing {
            Listing::Fixed(names) => return Ok(names.clone()),
            Listing::Endpoint(url) => url.clone(),
        };

        let body = self.get_text(url).await.map_err(SourceError::SourceUnavailable)?;
        let names: Vec<String> = serde_json::from_str(&body).map_err(|e| {
            SourceError::SourceUnavailable(format!("invalid listing response: {e}"))
        })?;
        tracing::debug!(count = names.len(), "Listed snapshots.");
        Ok(names)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch(&self, name: &str) -> Result<String, SourceError> {
        let url = self.snapshot_url(name)?;
        let body = self.get_text(url).await.map_err(|e| SourceError::fetch_failed(name, e))?;
        tracing::debug!(name, bytes = body.len(), "Fetched snapshot.");
        Ok(body)
    }
}
