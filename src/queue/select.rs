//! Candidate selection - pure, no I/O

use crate::types::PullRequest;

/// The two labels the queue reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLabels {
    /// Marks a PR as queued
    pub ready: String,
    /// Excludes a PR from the queue; wins over `ready`
    pub rejected: String,
}

/// Whether a PR may be picked this cycle
pub fn is_eligible(pr: &PullRequest, labels: &QueueLabels) -> bool {
    pr.has_label(&labels.ready) && !pr.has_label(&labels.rejected)
}

/// Pick the candidate for this cycle: the most recently created eligible PR.
///
/// Equal creation times resolve to the later PR in input order, the same
/// element a stable ascending sort would put last.
pub fn select<'a>(pull_requests: &'a [PullRequest], labels: &QueueLabels) -> Option<&'a PullRequest> {
    // max_by_key returns the last of several equal maxima
    pull_requests
        .iter()
        .filter(|pr| is_eligible(pr, labels))
        .max_by_key(|pr| pr.created_at)
}
