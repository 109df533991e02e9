//! Performs a single poll against the configured source and prints the result.

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{AppConfig, AppConfigError, ConfigValidationError},
    engine::{Poller, TickOutcome},
    http_client::HttpClientError,
    models::TickSummary,
    providers::{SourceError, create_source},
    store::{AnomalyOverlayView, CountSeriesView, SeriesStore},
};

/// Errors returned by the `once` subcommand.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] AppConfigError),
    /// The configuration is not usable.
    #[error("Config validation error: {0}")]
    Validation(#[from] ConfigValidationError),
    /// The source could not be listed.
    #[error("Snapshot source error: {0}")]
    Source(#[from] SourceError),
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientError),
    /// The tick did not run to completion.
    #[error("Poll was cancelled before completing")]
    Cancelled,
    /// The report could not be rendered.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Arguments of the `once` subcommand.
#[derive(Parser, Debug)]
pub struct OnceArgs {
    /// Directory containing `app.yaml`.
    #[arg(short, long)]
    config_dir: Option<String>,
    /// Print only the tick summary, without the series views.
    #[arg(long)]
    summary_only: bool,
}

/// The JSON document printed by `once`.
#[derive(Serialize)]
struct OnceReport {
    summary: TickSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<CountSeriesView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anomalies: Option<AnomalyOverlayView>,
}

/// Loads the configuration, runs one tick and prints the report to stdout.
pub async fn execute(args: OnceArgs) -> Result<(), Error> {
    let config = AppConfig::new(args.config_dir.as_deref())?;
    let report = poll_once(&config, args.summary_only).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn poll_once(config: &AppConfig, summary_only: bool) -> Result<OnceReport, Error> {
    let source = create_source(config)?;
    let store = Arc::new(SeriesStore::new(config.max_buckets()?));
    let poller = Poller::new(config, source, Arc::clone(&store), CancellationToken::new());

    let summary = match poller.tick().await {
        TickOutcome::Completed(summary) => summary,
        TickOutcome::SourceUnavailable(e) => return Err(e.into()),
        TickOutcome::Skipped | TickOutcome::Cancelled => return Err(Error::Cancelled),
    };

    Ok(OnceReport {
        summary,
        series: (!summary_only).then(|| store.count_series()),
        anomalies: (!summary_only).then(|| store.anomaly_overlay()),
    })
}
