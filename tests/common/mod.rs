//! Shared test fixtures

#![allow(dead_code)]

pub mod mock_platform;
pub mod mock_vcs;

pub use mock_platform::MockHostingService;
pub use mock_vcs::{MockVcs, VcsCall};
pub use temp_git::TempGitRepo;
pub use timeline::Timeline;

use chrono::DateTime;
use mergebot::auth::{AuthSource, Credentials};
use mergebot::config::DEFAULT_HOLD_MESSAGE;
use mergebot::queue::QueuePolicy;
use mergebot::types::{CommitId, HeadRef, PlatformConfig, PullRequest, Review, ReviewState, UserId};

pub const READY: &str = "ready-to-merge";
pub const REJECTED: &str = "merge-rejected";
pub const MAIN: &str = "refs/remotes/origin/main";

pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "testowner".to_string(),
        repo: "testrepo".to_string(),
        host: None,
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "x-access-token".to_string(),
        token: "ghp_test".to_string(),
        source: AuthSource::EnvVar,
    }
}

pub fn policy() -> QueuePolicy {
    QueuePolicy::new(READY, REJECTED, [DEFAULT_HOLD_MESSAGE])
}

/// Open PR against `main` created `created` seconds after the epoch
pub fn make_pr(number: u64, created: i64, labels: &[&str], head: &str) -> PullRequest {
    PullRequest {
        number,
        title: format!("PR {number}"),
        created_at: DateTime::from_timestamp(created, 0).unwrap(),
        labels: labels.iter().map(|l| (*l).to_string()).collect(),
        head: HeadRef {
            branch: format!("feature-{number}"),
            commit: CommitId::from(head),
            from_fork: false,
        },
        base_ref: "main".to_string(),
        author: Some(UserId(1000 + number)),
    }
}

pub fn review(author: u64, state: ReviewState) -> Review {
    Review {
        author: UserId(author),
        state,
    }
}

pub fn approval(author: u64) -> Review {
    review(author, ReviewState::Approved)
}

/// History where `main` has moved on after `feature` branched:
///
/// ```text
/// root - m1 - m2      (origin/main)
///          \
///           f1        (feature head)
/// ```
pub fn stale_history() -> MockVcs {
    MockVcs::new()
        .commit("root", &[])
        .commit("m1", &["root"])
        .commit("m2", &["m1"])
        .commit("f1", &["m1"])
        .with_ref(MAIN, "m2")
}

/// History where `feature` sits on top of `main`'s tip:
///
/// ```text
/// root - m1 - f1
///        (origin/main = m1)
/// ```
pub fn fresh_history() -> MockVcs {
    MockVcs::new()
        .commit("root", &[])
        .commit("m1", &["root"])
        .commit("f1", &["m1"])
        .with_ref(MAIN, "m1")
}
