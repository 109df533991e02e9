//! This module builds the retryable HTTP client used by HTTP snapshot sources.

mod client;

pub use client::{
    HttpClientError, create_base_http_client, create_http_client, create_retryable_http_client,
};
