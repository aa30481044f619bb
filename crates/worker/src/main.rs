//! sitecache host entry point.
//!
//! Boots the offline worker against the configured cache database, then
//! answers JSON request lines from stdin on stdout.
//! Logging goes to stderr to keep stdout line-clean.

use std::sync::Arc;

use anyhow::{Context, Result};
use sitecache_client::{FetchClient, FetchConfig};
use sitecache_core::{AppConfig, CacheDb};
use sitecache_worker::{OfflineWorker, host};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let worker_config = config.worker_config()?;

    tracing::info!(
        origin = %worker_config.origin,
        caches = %worker_config.names,
        db = %config.db_path.display(),
        "starting sitecache host"
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache database at {}", config.db_path.display()))?;

    let client = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        ..FetchConfig::default()
    })?;
    let network = Arc::new(client);

    let worker = OfflineWorker::new(worker_config, db, network.clone());
    worker.start().await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let answered = host::serve(&worker, network.as_ref(), stdin, tokio::io::stdout()).await?;

    tracing::info!(answered, "sitecache host stopped");
    Ok(())
}
