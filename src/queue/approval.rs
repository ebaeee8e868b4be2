//! Review approval aggregation

use crate::types::{Review, ReviewState, UserId};
use std::collections::HashMap;

/// Whether the reviews amount to a net approval.
///
/// Each author's last decisive review (approve or request changes) is their
/// verdict; advisory reviews are skipped entirely. The PR is approved when
/// at least one verdict approves and none requests changes.
pub fn approved(reviews: &[Review]) -> bool {
    let mut verdicts: HashMap<UserId, ReviewState> = HashMap::new();
    for review in reviews.iter().filter(|r| r.state.is_decisive()) {
        verdicts.insert(review.author, review.state);
    }

    let any_approval = verdicts.values().any(|s| *s == ReviewState::Approved);
    let any_objection = verdicts
        .values()
        .any(|s| *s == ReviewState::ChangesRequested);
    any_approval && !any_objection
}
