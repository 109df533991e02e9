use std::{num::NonZeroUsize, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use super::{
    BaseHttpClientConfig, ColumnMapping, HttpRetryConfig, ServerConfig, SourceConfig,
    deserialize_duration_from_ms, deserialize_duration_from_seconds,
};

/// Provides the default value for polling_interval_ms.
fn default_polling_interval() -> Duration {
    Duration::from_millis(5000)
}

/// Seven days of minute buckets.
fn default_max_buckets() -> usize {
    7 * 24 * 60
}

/// Provides the default value for fetch_concurrency.
fn default_fetch_concurrency() -> usize {
    4
}

/// Provides the default value for shutdown_timeout_secs.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Errors reported by `AppConfig::validate`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// The retention bound must keep at least one bucket.
    #[error("max_buckets must be greater than zero")]
    ZeroMaxBuckets,

    /// At least one snapshot must be fetched at a time.
    #[error("fetch_concurrency must be greater than zero")]
    ZeroFetchConcurrency,

    /// A zero polling interval would spin the poller.
    #[error("polling_interval_ms must be greater than zero")]
    ZeroPollingInterval,

    /// A column name in the mapping is empty.
    #[error("column name for '{0}' must not be empty")]
    EmptyColumnName(&'static str),

    /// Two fields of the mapping point at the same column.
    #[error("column '{0}' is mapped to more than one field")]
    DuplicateColumn(String),

    /// An HTTP source needs either a listing endpoint or fixed names.
    #[error("http source requires a listing_url or at least one entry in names")]
    EmptyHttpSource,
}

/// Errors that can occur while loading the application configuration.
#[derive(Debug, Error)]
pub enum AppConfigError {
    /// The configuration could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    /// The configuration was read but is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigValidationError),
}

/// Application configuration for countwatch.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The interval in milliseconds between poll ticks.
    #[serde(
        deserialize_with = "deserialize_duration_from_ms",
        default = "default_polling_interval"
    )]
    pub polling_interval_ms: Duration,

    /// The maximum number of buckets the series store retains.
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,

    /// The number of snapshots fetched and parsed concurrently within a tick.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// The maximum time in seconds to wait for graceful shutdown.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_shutdown_timeout"
    )]
    pub shutdown_timeout: Duration,

    /// Snapshot column names.
    #[serde(default)]
    pub columns: ColumnMapping,

    /// Where snapshots come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Configuration for HTTP client retry policies.
    #[serde(default)]
    pub http_retry_config: HttpRetryConfig,

    /// Configuration for the base HTTP client.
    #[serde(default)]
    pub http_base_config: BaseHttpClientConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: default_polling_interval(),
            max_buckets: default_max_buckets(),
            fetch_concurrency: default_fetch_concurrency(),
            shutdown_timeout: default_shutdown_timeout(),
            columns: ColumnMapping::default(),
            source: SourceConfig::default(),
            http_retry_config: HttpRetryConfig::default(),
            http_base_config: BaseHttpClientConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading `app.yaml` from the configuration
    /// directory, applying `COUNTWATCH__*` environment overrides and
    /// validating the result.
    pub fn new(config_dir: Option<&str>) -> Result<Self, AppConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("COUNTWATCH").separator("__").try_parsing(true))
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the rest of the application relies on.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_buckets == 0 {
            return Err(ConfigValidationError::ZeroMaxBuckets);
        }
        if self.fetch_concurrency == 0 {
            return Err(ConfigValidationError::ZeroFetchConcurrency);
        }
        if self.polling_interval_ms.is_zero() {
            return Err(ConfigValidationError::ZeroPollingInterval);
        }

        let columns = [
            ("key", &self.columns.key),
            ("count", &self.columns.count),
            ("anomaly", &self.columns.anomaly),
        ];
        for (field, name) in columns {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(field));
            }
        }
        for (i, (_, a)) in columns.iter().enumerate() {
            if columns[i + 1..].iter().any(|(_, b)| a.trim() == b.trim()) {
                return Err(ConfigValidationError::DuplicateColumn(a.trim().to_string()));
            }
        }

        if let SourceConfig::Http { listing_url: None, names, .. } = &self.source {
            if names.is_empty() {
                return Err(ConfigValidationError::EmptyHttpSource);
            }
        }

        Ok(())
    }

    /// The retention bound as a non-zero count.
    pub fn max_buckets(&self) -> Result<NonZeroUsize, ConfigValidationError> {
        NonZeroUsize::new(self.max_buckets).ok_or(ConfigValidationError::ZeroMaxBuckets)
    }
}
