//! Error types for mergebot

use std::time::Duration;
use thiserror::Error;

/// Errors that abort a poll cycle
///
/// Permanent merge or rebase failures are not errors: they are routed to the
/// rejection gate and end the cycle normally. Everything here propagates out
/// of the cycle without touching the candidate's labels.
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API returned something we could not use
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Transport or API failure reported by octocrab
    #[error("GitHub request failed: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// A git command exited unsuccessfully
    #[error("git error: {0}")]
    Git(String),

    /// Reading the local mirror through gix failed
    #[error("repository read error: {0}")]
    Gix(String),

    /// A ref or commit id could not be resolved in the local mirror
    #[error("cannot resolve '{0}' in the local mirror")]
    UnresolvableRef(String),

    /// Configuration is missing or malformed
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable credentials were found
    #[error("authentication error: {0}")]
    Auth(String),

    /// Repository spec could not be parsed into owner/repo
    #[error("invalid repository: {0}")]
    InvalidRepoSpec(String),

    /// The cycle exceeded its configured time budget
    #[error("cycle timed out after {0:?}")]
    Timeout(Duration),

    /// Filesystem or process spawn failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
