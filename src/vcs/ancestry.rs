//! Merge-base computation by walking commit parents

use super::VersionControl;
use crate::error::Result;
use crate::types::CommitId;
use std::collections::{HashSet, VecDeque};

/// Every commit reachable from `start`, including `start`, one `parents`
/// lookup per commit
pub async fn ancestors<V>(vcs: &V, start: &CommitId) -> Result<HashSet<CommitId>>
where
    V: VersionControl + ?Sized,
{
    let mut seen = HashSet::from([start.clone()]);
    let mut pending = vec![start.clone()];

    while let Some(commit) = pending.pop() {
        for parent in vcs.parents(&commit).await? {
            if seen.insert(parent.clone()) {
                pending.push(parent);
            }
        }
    }

    Ok(seen)
}

/// Whether `ancestor` is reachable from `descendant` (a commit is its own ancestor)
pub async fn is_ancestor<V>(vcs: &V, ancestor: &CommitId, descendant: &CommitId) -> Result<bool>
where
    V: VersionControl + ?Sized,
{
    if ancestor == descendant {
        return Ok(true);
    }
    Ok(vcs.ancestors(descendant).await?.contains(ancestor))
}

/// Lowest common ancestor of `one` and `two`.
///
/// Walks breadth-first from `two` and stops at the first commits that are
/// also ancestors of `one`. Of those, commits that are themselves ancestors
/// of another candidate are dropped. When criss-cross history leaves several
/// best candidates, the one nearest to `two` is returned.
pub async fn merge_base<V>(vcs: &V, one: &CommitId, two: &CommitId) -> Result<Option<CommitId>>
where
    V: VersionControl + ?Sized,
{
    if one == two {
        return Ok(Some(one.clone()));
    }

    let reachable_from_one = vcs.ancestors(one).await?;

    let mut candidates = Vec::new();
    let mut seen = HashSet::from([two.clone()]);
    let mut queue = VecDeque::from([two.clone()]);

    while let Some(commit) = queue.pop_front() {
        if reachable_from_one.contains(&commit) {
            candidates.push(commit);
            continue;
        }
        for parent in vcs.parents(&commit).await? {
            if seen.insert(parent.clone()) {
                queue.push_back(parent);
            }
        }
    }

    if candidates.len() <= 1 {
        return Ok(candidates.pop());
    }

    let mut dominated = HashSet::new();
    for candidate in &candidates {
        let below = vcs.ancestors(candidate).await?;
        dominated.extend(
            candidates
                .iter()
                .filter(|other| *other != candidate && below.contains(*other))
                .cloned(),
        );
    }

    Ok(candidates.into_iter().find(|c| !dominated.contains(c)))
}
