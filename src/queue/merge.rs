//! Merge driver for fresh candidates

use super::cycle::Orchestrator;
use super::reject::{FailureSignal, Verdict};
use crate::error::Result;
use crate::types::{MergeResult, PullRequest};
use tracing::{info, instrument};

/// Result of a merge attempt after the rejection gate has had its say
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The hosting service merged the PR
    Merged,
    /// The merge was refused
    Failed {
        /// The refusal as seen by the gate
        signal: FailureSignal,
        /// What the gate decided
        verdict: Verdict,
    },
}

/// Merge `candidate`, forwarding a refusal to the rejection gate
#[instrument(skip_all, fields(pr_number = candidate.number))]
pub async fn try_merge(
    orchestrator: &Orchestrator<'_>,
    candidate: &PullRequest,
) -> Result<MergeOutcome> {
    let policy = orchestrator.policy;
    let MergeResult { merged, message } = orchestrator
        .hosting
        .merge_pull_request(candidate.number, policy.merge_method)
        .await?;

    if merged {
        info!(method = %policy.merge_method, "merged");
        return Ok(MergeOutcome::Merged);
    }

    let signal = message.map_or(FailureSignal::MergeUnexplained, FailureSignal::MergeRefused);
    let verdict = policy
        .gate
        .maybe_reject(orchestrator.hosting, candidate, &signal)
        .await?;
    Ok(MergeOutcome::Failed { signal, verdict })
}
