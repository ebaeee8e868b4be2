//! Version control over a local mirror of the hosted repository
//!
//! [`VersionControl`] is the seam between the queue and git. The real
//! implementation is [`GitMirror`]; tests drive the queue with an in-memory
//! commit graph instead.

mod ancestry;
mod git;

pub use ancestry::{ancestors, is_ancestor, merge_base};
pub use git::{Committer, GitMirror, Procurement};

use crate::auth::Credentials;
use crate::error::Result;
use crate::types::{CommitId, RebaseOutcome};
use async_trait::async_trait;
use std::collections::HashSet;

/// Operations the queue performs on the local mirror
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Fetch branches and pull request heads from `remote`
    async fn fetch(&self, remote: &str, credentials: &Credentials) -> Result<()>;

    /// Check out `commit` (detached), discarding any unfinished rebase
    async fn checkout(&self, commit: &CommitId) -> Result<()>;

    /// Rebase the checked-out commit onto `upstream`.
    ///
    /// Conflicts are an [`RebaseOutcome::Conflict`], not an error; the
    /// working copy stays mid-rebase until [`abort_rebase`](Self::abort_rebase).
    async fn rebase(&self, upstream: &str) -> Result<RebaseOutcome>;

    /// Abort an in-progress rebase
    async fn abort_rebase(&self) -> Result<()>;

    /// Force-push HEAD to `branch` on `remote`
    async fn force_push(&self, remote: &str, branch: &str, credentials: &Credentials)
    -> Result<()>;

    /// Resolve a ref or object id to a commit.
    ///
    /// Unknown refs and malformed ids are [`Error::UnresolvableRef`](crate::error::Error::UnresolvableRef).
    async fn resolve(&self, spec: &str) -> Result<CommitId>;

    /// Parent commits of `commit`, first parent first
    async fn parents(&self, commit: &CommitId) -> Result<Vec<CommitId>>;

    /// Every commit reachable from `start`, including `start`
    async fn ancestors(&self, start: &CommitId) -> Result<HashSet<CommitId>> {
        ancestry::ancestors(self, start).await
    }

    /// Lowest common ancestor of two commits, if they share history
    async fn merge_base(&self, one: &CommitId, two: &CommitId) -> Result<Option<CommitId>> {
        ancestry::merge_base(self, one, two).await
    }
}
