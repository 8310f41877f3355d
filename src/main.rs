//! # Stats Server - Entry Point
//! src/main.rs

use anyhow::Context;
use clap::Parser;
use stats_server::config::Config;
use stats_server::dataset::Dataset;
use stats_server::jobs::{FsResultStore, JobManagerConfig};
use stats_server::logging;
use stats_server::server::{AppState, Server};
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // .env es opcional
    let _ = dotenvy::dotenv();

    let config = Config::parse();
    config.validate().context("invalid configuration")?;

    let _log_guard = logging::init(&config).context("failed to initialize logging")?;
    config.log_summary();

    let dataset = Dataset::load(&config.dataset)
        .with_context(|| format!("failed to load dataset from {}", config.dataset))?;
    info!(rows = dataset.len(), "dataset loaded");

    let results = FsResultStore::new(&config.results_dir)
        .with_context(|| format!("failed to prepare results directory {}", config.results_dir))?;

    let state = AppState::new(dataset, results, JobManagerConfig::from_config(&config))
        .context("failed to start job pool")?;

    let server = Server::bind(&config.address(), Arc::new(state))
        .with_context(|| format!("failed to bind {}", config.address()))?;

    server.run().context("server stopped unexpectedly")?;
    Ok(())
}
