//! Configuration module for countwatch.

mod app_config;
mod columns;
mod helpers;
mod http_base;
mod http_retry;
mod server;
mod source;

pub use app_config::{AppConfig, AppConfigError, ConfigValidationError};
pub use columns::ColumnMapping;
pub use helpers::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, serialize_duration_to_ms,
    serialize_duration_to_seconds,
};
pub use http_base::BaseHttpClientConfig;
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use server::ServerConfig;
pub use source::SourceConfig;
