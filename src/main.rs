//! mergebot daemon entry point

use anyhow::Context;
use mergebot::config::QueueConfig;
use mergebot::daemon;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = QueueConfig::load().context("failed to load configuration")?;
    daemon::run(config).await.context("merge queue stopped")?;
    Ok(())
}
