//! GitHub platform service implementation

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::platform::HostingService;
use crate::types::{
    CommitId, HeadRef, MergeMethod, MergeResult, PlatformConfig, PullRequest, Review,
    ReviewState, UserId,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::pulls::ReviewState as GhReviewState;
use serde_json::json;
use tracing::{debug, warn};

/// HTTP statuses GitHub uses to refuse a merge (not mergeable, head moved)
const MERGE_REFUSED_STATUSES: [u16; 2] = [405, 409];

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
}

impl GitHubService {
    /// Create a GitHub service authenticated with `credentials`
    pub fn new(credentials: &Credentials, config: PlatformConfig) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(credentials.token.clone());

        if let Some(ref h) = config.host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self { client, config })
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> Result<PullRequest> {
    let created_at = pr
        .created_at
        .ok_or_else(|| Error::GitHubApi(format!("PR #{} has no creation time", pr.number)))?;

    Ok(PullRequest {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        created_at,
        labels: pr
            .labels
            .iter()
            .flatten()
            .map(|label| label.name.clone())
            .collect(),
        head: HeadRef {
            branch: pr.head.ref_field.clone(),
            commit: CommitId::new(pr.head.sha.clone()),
            from_fork: is_fork(pr),
        },
        base_ref: pr.base.ref_field.clone(),
        author: pr.user.as_ref().map(|u| UserId(u.id.0)),
    })
}

/// Head and base live in different repositories. A deleted head repository
/// counts as a fork since there is nothing to push to.
fn is_fork(pr: &octocrab::models::pulls::PullRequest) -> bool {
    let head = pr.head.repo.as_ref().map(|r| r.id);
    let base = pr.base.repo.as_ref().map(|r| r.id);
    head.is_none() || head != base
}

fn review_state_from_octocrab(state: &GhReviewState) -> ReviewState {
    match state {
        GhReviewState::Approved => ReviewState::Approved,
        GhReviewState::ChangesRequested => ReviewState::ChangesRequested,
        GhReviewState::Dismissed => ReviewState::Dismissed,
        GhReviewState::Pending => ReviewState::Pending,
        // ReviewState is non-exhaustive; anything new is advisory until proven otherwise
        _ => ReviewState::Commented,
    }
}

#[async_trait]
impl HostingService for GitHubService {
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>> {
        debug!(repo = %self.config, "listing open PRs");
        let first_page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100)
            .send()
            .await?;

        let prs = self.client.all_pages(first_page).await?;
        let result = prs.iter().map(pr_from_octocrab).collect::<Result<Vec<_>>>()?;
        debug!(count = result.len(), "listed open PRs");
        Ok(result)
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        debug!(pr_number, "listing reviews");
        let first_page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list_reviews(pr_number)
            .per_page(100)
            .send()
            .await?;

        let reviews = self.client.all_pages(first_page).await?;

        // GitHub returns reviews in submission order; keep it
        let result: Vec<Review> = reviews
            .iter()
            .filter_map(|r| {
                let author = r.user.as_ref()?;
                let state = r.state.as_ref()?;
                Some(Review {
                    author: UserId(author.id.0),
                    state: review_state_from_octocrab(state),
                })
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed reviews");
        Ok(result)
    }

    async fn create_approval(&self, pr_number: u64, commit: &CommitId, body: &str) -> Result<()> {
        debug!(pr_number, commit = commit.short(), "submitting approval");
        let route = format!(
            "/repos/{}/{}/pulls/{pr_number}/reviews",
            self.config.owner, self.config.repo
        );
        let _: serde_json::Value = self
            .client
            .post(
                route,
                Some(&json!({
                    "commit_id": commit.as_str(),
                    "body": body,
                    "event": "APPROVE",
                })),
            )
            .await?;
        debug!(pr_number, "submitted approval");
        Ok(())
    }

    async fn add_label(&self, pr_number: u64, label: &str) -> Result<()> {
        debug!(pr_number, label, "adding label");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_labels(pr_number, &[label.to_string()])
            .await?;
        debug!(pr_number, label, "added label");
        Ok(())
    }

    async fn merge_pull_request(
        &self,
        pr_number: u64,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        debug!(pr_number, %method, "merging PR");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let response = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .merge(pr_number)
            .method(octocrab_method)
            .send()
            .await;

        let merge_result = match response {
            Ok(merge) => MergeResult {
                merged: merge.merged,
                message: merge.message,
            },
            Err(octocrab::Error::GitHub { source, .. })
                if MERGE_REFUSED_STATUSES.contains(&source.status_code.as_u16()) =>
            {
                warn!(pr_number, message = %source.message, "GitHub refused merge");
                MergeResult {
                    merged: false,
                    message: Some(source.message.clone()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        debug!(pr_number, merged = merge_result.merged, "merge attempt complete");
        Ok(merge_result)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
