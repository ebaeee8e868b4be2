//! Mock hosting service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use super::Timeline;
use mergebot::error::{Error, Result};
use mergebot::platform::HostingService;
use mergebot::types::{CommitId, MergeMethod, MergeResult, PlatformConfig, PullRequest, Review};
use std::collections::HashMap;
use std::sync::Mutex;

/// Call record for `add_label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLabelCall {
    pub pr_number: u64,
    pub label: String,
}

/// Call record for `create_approval`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalCall {
    pub pr_number: u64,
    pub commit: CommitId,
    pub body: String,
}

/// Call record for `merge_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub method: MergeMethod,
}

/// Simple mock hosting service
///
/// Features:
/// - Stored open PRs, mutated by `add_label` so later cycles see the label
/// - Per-PR reviews and merge responses
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockHostingService {
    config: PlatformConfig,
    pull_requests: Mutex<Vec<PullRequest>>,
    reviews: Mutex<HashMap<u64, Vec<Review>>>,
    merge_responses: Mutex<HashMap<u64, MergeResult>>,
    // Call tracking
    list_prs_calls: Mutex<usize>,
    list_reviews_calls: Mutex<Vec<u64>>,
    add_label_calls: Mutex<Vec<AddLabelCall>>,
    approval_calls: Mutex<Vec<ApprovalCall>>,
    merge_calls: Mutex<Vec<MergePrCall>>,
    timeline: Timeline,
    // Error injection
    error_on_list_prs: Mutex<Option<String>>,
    error_on_merge: Mutex<Option<String>>,
}

impl MockHostingService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            pull_requests: Mutex::new(Vec::new()),
            reviews: Mutex::new(HashMap::new()),
            merge_responses: Mutex::new(HashMap::new()),
            list_prs_calls: Mutex::new(0),
            timeline: Timeline::default(),
            list_reviews_calls: Mutex::new(Vec::new()),
            add_label_calls: Mutex::new(Vec::new()),
            approval_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            error_on_list_prs: Mutex::new(None),
            error_on_merge: Mutex::new(None),
        }
    }

    // === Setup methods ===

    /// Add an open PR
    pub fn add_pull_request(&self, pr: PullRequest) {
        self.pull_requests.lock().unwrap().push(pr);
    }

    /// Set the reviews for a PR
    pub fn set_reviews(&self, pr_number: u64, reviews: Vec<Review>) {
        self.reviews.lock().unwrap().insert(pr_number, reviews);
    }

    /// Set the response for `merge_pull_request` for a specific PR
    pub fn set_merge_response(&self, pr_number: u64, result: MergeResult) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(pr_number, result);
    }

    /// Make the merge of `pr_number` be refused with `message`
    pub fn refuse_merge(&self, pr_number: u64, message: &str) {
        self.set_merge_response(
            pr_number,
            MergeResult {
                merged: false,
                message: Some(message.to_string()),
            },
        );
    }

    // === Error injection methods ===

    /// Make `list_open_pull_requests` return an error
    pub fn fail_list_prs(&self, msg: &str) {
        *self.error_on_list_prs.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge_pull_request` return an error
    pub fn fail_merge(&self, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification methods ===

    /// Shared log of hosting calls; hand it to other mocks to interleave theirs
    pub fn timeline(&self) -> Timeline {
        self.timeline.clone()
    }

    pub fn list_prs_count(&self) -> usize {
        *self.list_prs_calls.lock().unwrap()
    }

    pub fn get_list_reviews_calls(&self) -> Vec<u64> {
        self.list_reviews_calls.lock().unwrap().clone()
    }

    pub fn get_add_label_calls(&self) -> Vec<AddLabelCall> {
        self.add_label_calls.lock().unwrap().clone()
    }

    pub fn get_approval_calls(&self) -> Vec<ApprovalCall> {
        self.approval_calls.lock().unwrap().clone()
    }

    pub fn get_merge_calls(&self) -> Vec<MergePrCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Whether nothing was written to the hosting service
    pub fn no_mutations(&self) -> bool {
        self.get_add_label_calls().is_empty()
            && self.get_approval_calls().is_empty()
            && self.get_merge_calls().is_empty()
    }
}

#[async_trait]
impl HostingService for MockHostingService {
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>> {
        *self.list_prs_calls.lock().unwrap() += 1;
        self.timeline.record("list_prs");
        if let Some(msg) = self.error_on_list_prs.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(self.pull_requests.lock().unwrap().clone())
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        self.list_reviews_calls.lock().unwrap().push(pr_number);
        self.timeline.record("list_reviews");
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_approval(&self, pr_number: u64, commit: &CommitId, body: &str) -> Result<()> {
        self.timeline.record("approve");
        self.approval_calls.lock().unwrap().push(ApprovalCall {
            pr_number,
            commit: commit.clone(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn add_label(&self, pr_number: u64, label: &str) -> Result<()> {
        self.timeline.record("add_label");
        self.add_label_calls.lock().unwrap().push(AddLabelCall {
            pr_number,
            label: label.to_string(),
        });
        if let Some(pr) = self
            .pull_requests
            .lock()
            .unwrap()
            .iter_mut()
            .find(|pr| pr.number == pr_number)
        {
            pr.labels.insert(label.to_string());
        }
        Ok(())
    }

    async fn merge_pull_request(
        &self,
        pr_number: u64,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        self.timeline.record("merge");
        self.merge_calls
            .lock()
            .unwrap()
            .push(MergePrCall { pr_number, method });

        if let Some(msg) = self.error_on_merge.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        Ok(self
            .merge_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or(MergeResult {
                merged: true,
                message: Some("Pull Request successfully merged".to_string()),
            }))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
