//! Merge queue engine
//!
//! One poll cycle, in order:
//! 1. Select - pick at most one candidate from the open PRs (pure)
//! 2. Check freshness - is the candidate based on the target tip?
//! 3. Merge it if fresh, otherwise rebase and force-push it
//! 4. Route any failure through the rejection gate

mod approval;
mod cycle;
mod freshness;
mod merge;
mod reject;
mod select;
mod update;

pub use approval::approved;
pub use cycle::{CycleOutcome, Orchestrator};
pub use freshness::{is_up_to_date, remote_branch_ref};
pub use merge::{MergeOutcome, try_merge};
pub use reject::{FailureSignal, RejectionGate, RejectionPolicy, Verdict};
pub use select::{QueueLabels, is_eligible, select};
pub use update::{UpdateOutcome, update_candidate};

use crate::config::{DEFAULT_REAPPROVE_MESSAGE, QueueConfig};
use crate::types::MergeMethod;

/// The parts of [`QueueConfig`] that shape decisions within a cycle
#[derive(Debug, Clone)]
pub struct QueuePolicy {
    /// Ready/rejected labels
    pub labels: QueueLabels,
    /// Remote name in the local mirror
    pub remote: String,
    /// How fresh candidates are merged
    pub merge_method: MergeMethod,
    /// Body of automatic re-approval reviews
    pub reapprove_message: String,
    /// Hold-or-reject decisions
    pub gate: RejectionGate,
}

impl QueuePolicy {
    /// Derive the cycle policy from daemon configuration
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            labels: QueueLabels {
                ready: config.ready_label.clone(),
                rejected: config.rejected_label.clone(),
            },
            remote: config.remote.clone(),
            merge_method: config.merge_method,
            reapprove_message: config.reapprove_message.clone(),
            gate: RejectionGate::new(
                RejectionPolicy::new(config.hold_messages.iter().cloned()),
                config.rejected_label.clone(),
            ),
        }
    }

    /// Policy with the given labels and hold list, defaults elsewhere
    pub fn new<I, S>(ready_label: &str, rejected_label: &str, hold_messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: QueueLabels {
                ready: ready_label.to_string(),
                rejected: rejected_label.to_string(),
            },
            remote: "origin".to_string(),
            merge_method: MergeMethod::default(),
            reapprove_message: DEFAULT_REAPPROVE_MESSAGE.to_string(),
            gate: RejectionGate::new(RejectionPolicy::new(hold_messages), rejected_label),
        }
    }
}
