//! Rejection gate: hold a candidate for retry, or drop it from the queue

use crate::error::Result;
use crate::platform::HostingService;
use crate::types::{PullRequest, RebaseStatus};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{info, warn};

/// Why a candidate could not make progress this cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSignal {
    /// The hosting service refused the merge with this message
    MergeRefused(String),
    /// The hosting service did not merge and gave no reason
    MergeUnexplained,
    /// Rebasing onto the target branch stopped
    Rebase(RebaseStatus),
    /// The candidate is stale but its branch lives in a fork the queue cannot push to
    ForkHead,
}

impl fmt::Display for FailureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MergeRefused(message) => f.write_str(message),
            Self::MergeUnexplained => f.write_str("merge was not performed"),
            Self::Rebase(status) => write!(f, "{status}"),
            Self::ForkHead => f.write_str("head branch is in a fork and cannot be updated"),
        }
    }
}

/// What the gate decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Leave the candidate queued; it is re-evaluated next cycle
    Hold,
    /// Label the candidate rejected
    Reject,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hold => write!(f, "hold"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Allow-list of failure messages known to be transient.
///
/// Matching is exact on the signal's text. Anything not listed is treated
/// as permanent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionPolicy {
    hold_messages: BTreeSet<String>,
}

impl RejectionPolicy {
    /// Build a policy from the configured hold messages
    pub fn new<I, S>(hold_messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hold_messages: hold_messages.into_iter().map(Into::into).collect(),
        }
    }

    /// Map a failure signal to a verdict
    pub fn classify(&self, signal: &FailureSignal) -> Verdict {
        if self.hold_messages.contains(&signal.to_string()) {
            Verdict::Hold
        } else {
            Verdict::Reject
        }
    }
}

/// Applies [`RejectionPolicy`] verdicts to candidates
#[derive(Debug, Clone)]
pub struct RejectionGate {
    policy: RejectionPolicy,
    rejected_label: String,
}

impl RejectionGate {
    /// Create a gate that labels rejected candidates with `rejected_label`
    pub fn new(policy: RejectionPolicy, rejected_label: impl Into<String>) -> Self {
        Self {
            policy,
            rejected_label: rejected_label.into(),
        }
    }

    /// Label used for rejected candidates
    pub fn rejected_label(&self) -> &str {
        &self.rejected_label
    }

    /// Reject `candidate` unless `signal` is a known transient failure
    pub async fn maybe_reject(
        &self,
        hosting: &dyn HostingService,
        candidate: &PullRequest,
        signal: &FailureSignal,
    ) -> Result<Verdict> {
        let verdict = self.policy.classify(signal);
        match verdict {
            Verdict::Hold => {
                info!(pr_number = candidate.number, %signal, "transient failure, holding");
            }
            Verdict::Reject => {
                warn!(pr_number = candidate.number, %signal, "rejecting from queue");
                hosting
                    .add_label(candidate.number, &self.rejected_label)
                    .await?;
            }
        }
        Ok(verdict)
    }
}
