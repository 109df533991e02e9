//! This module provides functionality to create a retryable HTTP client with
//! middleware for handling transient errors, such as network issues or rate
//! limiting.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{Jitter, RetryTransientMiddleware, policies::ExponentialBackoff};
use thiserror::Error;

use crate::config::{BaseHttpClientConfig, HttpRetryConfig, JitterSetting};

/// Errors that can occur while constructing an HTTP client.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// An error occurred while building the underlying `reqwest::Client`.
    #[error("Failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Builds the plain `reqwest::Client` from the connection settings.
pub fn create_base_http_client(
    config: &BaseHttpClientConfig,
) -> Result<reqwest::Client, HttpClientError> {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(Some(config.idle_timeout))
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()?;
    Ok(client)
}

/// Wraps `base_client` with a transient-error retry policy.
///
/// # Parameters:
/// - `config`: Configuration for retry policies
/// - `base_client`: The base HTTP client to use
pub fn create_retryable_http_client(
    config: &HttpRetryConfig,
    base_client: reqwest::Client,
) -> ClientWithMiddleware {
    let policy_builder = match config.jitter {
        JitterSetting::None => ExponentialBackoff::builder().jitter(Jitter::None),
        JitterSetting::Full => ExponentialBackoff::builder().jitter(Jitter::Full),
    };

    let retry_policy = policy_builder
        .base(config.base_for_backoff)
        .retry_bounds(config.initial_backoff_ms, config.max_backoff_secs)
        .build_with_max_retries(config.max_retries);

    ClientBuilder::new(base_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

/// Builds the base client and wraps it with the retry policy.
pub fn create_http_client(
    base: &BaseHttpClientConfig,
    retry: &HttpRetryConfig,
) -> Result<ClientWithMiddleware, HttpClientError> {
    Ok(create_retryable_http_client(retry, create_base_http_client(base)?))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_retryable_client_retries_transient_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server.mock("GET", "/flaky").with_status(503).expect(3).create_async().await;

        let retry = HttpRetryConfig {
            max_retries: 2,
            initial_backoff_ms: Duration::from_millis(1),
            max_backoff_secs: Duration::from_millis(5),
            jitter: JitterSetting::None,
            ..Default::default()
        };
        let client = create_http_client(&BaseHttpClientConfig::default(), &retry).unwrap();

        let response = client.get(format!("{}/flaky", server.url())).send().await.unwrap();

        assert_eq!(response.status(), 503);
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_retryable_client_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let missing =
            server.mock("GET", "/missing").with_status(404).expect(1).create_async().await;

        let retry = HttpRetryConfig::default();
        let client = create_http_client(&BaseHttpClientConfig::default(), &retry).unwrap();

        let response = client.get(format!("{}/missing", server.url())).send().await.unwrap();

        assert_eq!(response.status(), 404);
        missing.assert_async().await;
    }

    #[test]
    fn test_base_client_builds_from_config() {
        let config = BaseHttpClientConfig {
            max_idle_per_host: 1,
            request_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(create_base_http_client(&config).is_ok());
    }
}
