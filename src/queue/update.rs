//! Update driver: rebase a stale candidate and keep its approval

use super::approval::approved;
use super::cycle::Orchestrator;
use super::freshness::remote_branch_ref;
use super::reject::{FailureSignal, Verdict};
use crate::error::Result;
use crate::types::{CommitId, PullRequest, RebaseOutcome};
use tracing::{info, instrument};

/// Result of trying to bring a candidate up to date
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Head rewritten and force-pushed
    Rebased {
        /// New head commit
        new_head: CommitId,
        /// Whether an approving review was re-issued on `new_head`
        reapproved: bool,
    },
    /// Head could not be updated; nothing was pushed
    Failed {
        /// The failure as seen by the gate
        signal: FailureSignal,
        /// What the rejection gate decided
        verdict: Verdict,
    },
}

/// Rebase `candidate` onto its target branch and force-push the result.
///
/// Approval is captured before history is rewritten; if the candidate was
/// approved, a fresh approval is submitted on the new head. Never merges.
///
/// Heads in forks are not rebased: the branch cannot be pushed, so the
/// candidate goes straight to the rejection gate.
#[instrument(skip_all, fields(pr_number = candidate.number))]
pub async fn update_candidate(
    orchestrator: &Orchestrator<'_>,
    candidate: &PullRequest,
) -> Result<UpdateOutcome> {
    let hosting = orchestrator.hosting;
    let vcs = orchestrator.vcs;
    let policy = orchestrator.policy;

    if candidate.head.from_fork {
        let signal = FailureSignal::ForkHead;
        let verdict = policy.gate.maybe_reject(hosting, candidate, &signal).await?;
        return Ok(UpdateOutcome::Failed { signal, verdict });
    }

    let was_approved = approved(&hosting.list_reviews(candidate.number).await?);

    vcs.fetch(&policy.remote, orchestrator.credentials).await?;
    vcs.checkout(&candidate.head.commit).await?;

    let upstream = remote_branch_ref(&policy.remote, &candidate.base_ref);
    let new_head = match vcs.rebase(&upstream).await? {
        RebaseOutcome::Clean(new_head) => new_head,
        RebaseOutcome::Conflict(status) => {
            let signal = FailureSignal::Rebase(status);
            let verdict = policy.gate.maybe_reject(hosting, candidate, &signal).await?;
            vcs.abort_rebase().await?;
            return Ok(UpdateOutcome::Failed { signal, verdict });
        }
    };

    vcs.force_push(
        &policy.remote,
        &candidate.head.branch,
        orchestrator.credentials,
    )
    .await?;
    info!(
        branch = %candidate.head.branch,
        old_head = candidate.head.commit.short(),
        new_head = new_head.short(),
        "force-pushed rebased head"
    );

    if was_approved {
        hosting
            .create_approval(candidate.number, &new_head, &policy.reapprove_message)
            .await?;
        info!(new_head = new_head.short(), "re-approved rebased head");
    }

    Ok(UpdateOutcome::Rebased {
        new_head,
        reapproved: was_approved,
    })
}
