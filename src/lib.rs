#![warn(missing_docs)]
//! countwatch polls snapshots of per-interval request counts, keeps a bounded,
//! ordered series of them and publishes the series and its anomalous buckets.

pub mod cmd;
pub mod config;
pub mod engine;
pub mod http_client;
pub mod http_server;
pub mod models;
pub mod parser;
pub mod providers;
pub mod store;
pub mod supervisor;
