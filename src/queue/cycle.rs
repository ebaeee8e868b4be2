//! One poll cycle of the merge queue

use super::QueuePolicy;
use super::freshness::is_up_to_date;
use super::merge::{MergeOutcome, try_merge};
use super::reject::{FailureSignal, Verdict};
use super::select::select;
use super::update::{UpdateOutcome, update_candidate};
use crate::auth::Credentials;
use crate::error::Result;
use crate::platform::HostingService;
use crate::types::CommitId;
use crate::vcs::VersionControl;
use std::fmt;
use tracing::{info, instrument};

/// What a cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No eligible candidate
    Idle,
    /// Candidate was fresh and merged
    Merged {
        /// PR number
        pr_number: u64,
    },
    /// Candidate was stale and has been rebased and force-pushed
    Updated {
        /// PR number
        pr_number: u64,
        /// Head after the rebase
        new_head: CommitId,
        /// Whether approval was re-issued
        reapproved: bool,
    },
    /// Candidate hit a known transient failure and stays queued
    Held {
        /// PR number
        pr_number: u64,
        /// The failure
        signal: FailureSignal,
    },
    /// Candidate was labeled rejected
    Rejected {
        /// PR number
        pr_number: u64,
        /// The failure
        signal: FailureSignal,
    },
}

impl CycleOutcome {
    fn from_failure(pr_number: u64, signal: FailureSignal, verdict: Verdict) -> Self {
        match verdict {
            Verdict::Hold => Self::Held { pr_number, signal },
            Verdict::Reject => Self::Rejected { pr_number, signal },
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "no candidate"),
            Self::Merged { pr_number } => write!(f, "merged PR #{pr_number}"),
            Self::Updated {
                pr_number,
                new_head,
                reapproved,
            } => {
                write!(f, "updated PR #{pr_number} to {}", new_head.short())?;
                if *reapproved {
                    write!(f, " (re-approved)")?;
                }
                Ok(())
            }
            Self::Held { pr_number, signal } => write!(f, "holding PR #{pr_number}: {signal}"),
            Self::Rejected { pr_number, signal } => {
                write!(f, "rejected PR #{pr_number}: {signal}")
            }
        }
    }
}

/// Drives a single cycle against one repository.
///
/// Holds borrowed collaborators for the duration of the cycle only;
/// credentials are resolved by the caller and never outlive it.
pub struct Orchestrator<'a> {
    pub(super) hosting: &'a dyn HostingService,
    pub(super) vcs: &'a dyn VersionControl,
    pub(super) credentials: &'a Credentials,
    pub(super) policy: &'a QueuePolicy,
}

impl<'a> Orchestrator<'a> {
    /// Wire up a cycle
    pub fn new(
        hosting: &'a dyn HostingService,
        vcs: &'a dyn VersionControl,
        credentials: &'a Credentials,
        policy: &'a QueuePolicy,
    ) -> Self {
        Self {
            hosting,
            vcs,
            credentials,
            policy,
        }
    }

    /// Select, check freshness, then merge or update.
    ///
    /// Any `Err` aborts the cycle without touching the candidate's labels.
    #[instrument(skip_all, fields(repo = %self.hosting.config()))]
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let pull_requests = self.hosting.list_open_pull_requests().await?;

        let Some(candidate) = select(&pull_requests, &self.policy.labels) else {
            info!(open = pull_requests.len(), "no eligible candidate");
            return Ok(CycleOutcome::Idle);
        };
        info!(
            pr_number = candidate.number,
            title = %candidate.title,
            head = candidate.head.commit.short(),
            base = %candidate.base_ref,
            "selected candidate"
        );

        let fresh = is_up_to_date(
            self.vcs,
            &self.policy.remote,
            self.credentials,
            &candidate.head.commit,
            &candidate.base_ref,
        )
        .await?;

        let pr_number = candidate.number;
        let outcome = if fresh {
            match try_merge(self, candidate).await? {
                MergeOutcome::Merged => CycleOutcome::Merged { pr_number },
                MergeOutcome::Failed { signal, verdict } => {
                    CycleOutcome::from_failure(pr_number, signal, verdict)
                }
            }
        } else {
            info!(pr_number, "candidate is behind its target, updating");
            match update_candidate(self, candidate).await? {
                UpdateOutcome::Rebased {
                    new_head,
                    reapproved,
                } => CycleOutcome::Updated {
                    pr_number,
                    new_head,
                    reapproved,
                },
                UpdateOutcome::Failed { signal, verdict } => {
                    CycleOutcome::from_failure(pr_number, signal, verdict)
                }
            }
        };

        Ok(outcome)
    }
}
