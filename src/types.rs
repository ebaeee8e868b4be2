//! Core types for mergebot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A git commit identifier (full hex object id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap a hex object id
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex form of this id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log output
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitId {
    fn from(hex: &str) -> Self {
        Self::new(hex)
    }
}

/// Opaque identity of a GitHub user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// The head side of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRef {
    /// Branch name the PR is opened from
    pub branch: String,
    /// Commit the branch currently points to
    pub commit: CommitId,
    /// Branch lives in another repository, so the queue cannot push to it
    pub from_fork: bool,
}

/// A pull request snapshot, fetched once per cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title (for log output)
    pub title: String,
    /// When the PR was opened
    pub created_at: DateTime<Utc>,
    /// Label names currently on the PR
    pub labels: BTreeSet<String>,
    /// Head branch and commit
    pub head: HeadRef,
    /// Target branch name
    pub base_ref: String,
    /// PR author
    pub author: Option<UserId>,
}

impl PullRequest {
    /// Whether the PR carries the given label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// Review state as reported by the hosting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    /// Reviewer approved the changes
    Approved,
    /// Reviewer asked for changes
    ChangesRequested,
    /// Plain comment review
    Commented,
    /// Review was dismissed
    Dismissed,
    /// Review started but not submitted
    Pending,
}

impl ReviewState {
    /// Whether this state carries a verdict.
    ///
    /// Only approvals and change requests count; everything else is advisory.
    pub const fn is_decisive(self) -> bool {
        matches!(self, Self::Approved | Self::ChangesRequested)
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
            Self::ChangesRequested => write!(f, "CHANGES_REQUESTED"),
            Self::Commented => write!(f, "COMMENTED"),
            Self::Dismissed => write!(f, "DISMISSED"),
            Self::Pending => write!(f, "PENDING"),
        }
    }
}

/// A review on a pull request.
///
/// Reviews are handed around in submission order; the position in the
/// sequence is the ordering used for "last verdict wins".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review author
    pub author: UserId,
    /// Review state
    pub state: ReviewState,
}

/// Hosting platform configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

impl PlatformConfig {
    /// HTTPS clone URL of the repository
    pub fn clone_url(&self) -> String {
        let host = self.host.as_deref().unwrap_or("github.com");
        format!("https://{host}/{}/{}.git", self.owner, self.repo)
    }
}

impl fmt::Display for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Result of a merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether the merge was performed
    pub merged: bool,
    /// Message from the hosting service (the reason, on refusal)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Squash all commits into one
    Squash,
    /// Create a merge commit
    #[default]
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

impl std::str::FromStr for MergeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "squash" => Ok(Self::Squash),
            "merge" => Ok(Self::Merge),
            "rebase" => Ok(Self::Rebase),
            other => Err(format!("unknown merge method '{other}'")),
        }
    }
}

/// Why a rebase did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseStatus {
    /// Rebase stopped on conflicting paths
    Conflict {
        /// Paths git reported as unmerged
        paths: Vec<String>,
    },
    /// Rebase failed for some other reason (git's diagnostic output)
    Failed(String),
}

impl fmt::Display for RebaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { paths } if paths.is_empty() => write!(f, "rebase conflict"),
            Self::Conflict { paths } => write!(f, "rebase conflict in {}", paths.join(", ")),
            Self::Failed(detail) => write!(f, "rebase failed: {detail}"),
        }
    }
}

/// Outcome of rebasing the checked-out head onto an upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// Rebase finished; HEAD now points at the rewritten commit
    Clean(CommitId),
    /// Rebase stopped; the working copy is mid-rebase until aborted
    Conflict(RebaseStatus),
}
