//! Hosting platform services
//!
//! Everything the merge queue needs from the hosting service goes through
//! [`HostingService`], so the queue logic can run against GitHub or a mock.

mod detection;
mod github;

pub use detection::parse_repo_info;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{CommitId, MergeMethod, MergeResult, PlatformConfig, PullRequest, Review};
use async_trait::async_trait;

/// Platform service trait for the hosting API calls the queue consumes
#[async_trait]
pub trait HostingService: Send + Sync {
    /// List every open pull request with labels, refs, author and creation time
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>>;

    /// List reviews on a PR in submission order
    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>>;

    /// Submit an approving review pinned to `commit`
    async fn create_approval(&self, pr_number: u64, commit: &CommitId, body: &str) -> Result<()>;

    /// Add a label to a PR
    async fn add_label(&self, pr_number: u64, label: &str) -> Result<()>;

    /// Attempt to merge a PR.
    ///
    /// A merge the service refuses is `Ok` with `merged: false` and the
    /// service's message; only transport and auth problems are `Err`.
    async fn merge_pull_request(&self, pr_number: u64, method: MergeMethod)
    -> Result<MergeResult>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
