//! Freshness check: is the candidate based on the target branch's tip?

use crate::auth::Credentials;
use crate::error::Result;
use crate::types::CommitId;
use crate::vcs::VersionControl;
use tracing::debug;

/// Remote-tracking ref for `branch` on `remote`
pub fn remote_branch_ref(remote: &str, branch: &str) -> String {
    format!("refs/remotes/{remote}/{branch}")
}

/// Whether `candidate_head` already contains the tip of `target_branch`.
///
/// Fetches first so both commits are present, then compares the merge-base
/// of (target tip, candidate head) with the target tip. This says nothing
/// about conflicts, only that the target has not moved past the candidate's
/// base. Unresolvable commits are errors, never `false`.
pub async fn is_up_to_date(
    vcs: &dyn VersionControl,
    remote: &str,
    credentials: &Credentials,
    candidate_head: &CommitId,
    target_branch: &str,
) -> Result<bool> {
    vcs.fetch(remote, credentials).await?;

    let target_tip = vcs.resolve(&remote_branch_ref(remote, target_branch)).await?;
    let head = vcs.resolve(candidate_head.as_str()).await?;
    let base = vcs.merge_base(&target_tip, &head).await?;

    let up_to_date = base.as_ref() == Some(&target_tip);
    debug!(
        head = head.short(),
        target = target_tip.short(),
        merge_base = base.as_ref().map(CommitId::short),
        up_to_date,
        "checked freshness"
    );
    Ok(up_to_date)
}
