use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

fn default_extension() -> String {
    "csv".to_string()
}

/// Where snapshots are listed and fetched from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Snapshots published over HTTP.
    Http {
        /// Base URL every snapshot name is resolved against. Should end with
        /// a `/` when it points at a directory.
        base_url: Url,

        /// Endpoint returning a JSON array of snapshot names. When absent,
        /// `names` is used as a fixed listing.
        #[serde(default)]
        listing_url: Option<Url>,

        /// Fixed snapshot names, e.g. a single `minute_counts.csv`.
        #[serde(default)]
        names: Vec<String>,
    },

    /// Snapshot files in a local directory.
    Directory {
        /// Directory to scan on every tick.
        path: PathBuf,

        /// File extension (without the dot) a file must have to be listed.
        #[serde(default = "default_extension")]
        extension: String,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Directory { path: PathBuf::from("sensor_data"), extension: default_extension() }
    }
}
