//! Fixed-delay polling loop

use crate::auth::get_github_auth;
use crate::config::QueueConfig;
use crate::error::{Error, Result};
use crate::platform::GitHubService;
use crate::queue::{CycleOutcome, Orchestrator, QueuePolicy};
use crate::vcs::{GitMirror, Procurement};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Run `cycle` every `interval` until `shutdown` resolves.
///
/// Cycles never overlap. A cycle that overruns its slot delays the next one
/// instead of causing a burst of catch-up cycles. Shutdown is only observed
/// between cycles. Returns the number of cycles run.
pub async fn poll_loop<F, Fut, S>(interval: Duration, shutdown: S, mut cycle: F) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CycleOutcome>>,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles = 0;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        cycles += 1;
        match cycle().await {
            Ok(CycleOutcome::Idle) => info!(cycle = cycles, "cycle complete, queue empty"),
            Ok(outcome) => info!(cycle = cycles, %outcome, "cycle complete"),
            Err(e) => warn!(cycle = cycles, error = %e, "cycle aborted"),
        }
    }

    info!(cycles, "poll loop stopped");
    cycles
}

/// Open the local mirror, cloning it on first use
async fn procure_mirror(
    config: &QueueConfig,
    credentials: &crate::auth::Credentials,
) -> Result<GitMirror> {
    match GitMirror::procure(&config.mirror_dir, config.committer.clone())? {
        Procurement::Found(mirror) => Ok(mirror),
        Procurement::NotPresent => {
            GitMirror::clone_into(
                &config.platform.clone_url(),
                &config.mirror_dir,
                credentials,
                config.committer.clone(),
            )
            .await
        }
    }
}

/// One complete cycle against GitHub and the on-disk mirror.
///
/// Credentials are resolved fresh and dropped when the cycle ends.
pub async fn run_once(config: &QueueConfig, policy: &QueuePolicy) -> Result<CycleOutcome> {
    let credentials = get_github_auth().await?;
    let hosting = GitHubService::new(&credentials, config.platform.clone())?;
    let mirror = procure_mirror(config, &credentials).await?;

    let orchestrator = Orchestrator::new(&hosting, &mirror, &credentials, policy);
    match config.cycle_timeout {
        Some(limit) => tokio::time::timeout(limit, orchestrator.run_cycle())
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => orchestrator.run_cycle().await,
    }
}

/// Run the daemon until Ctrl-C
pub async fn run(config: QueueConfig) -> Result<()> {
    let policy = QueuePolicy::from_config(&config);
    info!(
        repo = %config.platform,
        mirror = %config.mirror_dir.display(),
        interval_secs = config.poll_interval.as_secs(),
        ready = %policy.labels.ready,
        rejected = %policy.labels.rejected,
        "starting merge queue"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    };

    poll_loop(config.poll_interval, shutdown, || run_once(&config, &policy)).await;
    Ok(())
}
