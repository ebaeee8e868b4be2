//! Daemon configuration
//!
//! Loaded from an optional TOML file named by `MERGEBOT_CONFIG`, then
//! overridden by `MERGEBOT_*` environment variables.

use crate::error::{Error, Result};
use crate::platform::parse_repo_info;
use crate::types::{MergeMethod, PlatformConfig};
use crate::vcs::Committer;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Message GitHub returns while a required status check is still running
pub const DEFAULT_HOLD_MESSAGE: &str =
    "Required status check \"continuous-integration/travis-ci\" is in progress.";

/// Body of the review re-issued after the bot rewrites an approved head
pub const DEFAULT_REAPPROVE_MESSAGE: &str =
    "Automatically re-approved after rebasing onto the target branch.";

const DEFAULT_READY_LABEL: &str = "ready-to-merge";
const DEFAULT_REJECTED_LABEL: &str = "merge-rejected";
const DEFAULT_REMOTE: &str = "origin";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Everything the daemon needs besides credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Repository the queue serves
    pub platform: PlatformConfig,
    /// Remote name in the local mirror
    pub remote: String,
    /// Where the local mirror lives
    pub mirror_dir: PathBuf,
    /// Label marking a PR as queued
    pub ready_label: String,
    /// Label marking a PR as rejected from the queue
    pub rejected_label: String,
    /// Delay between poll cycles
    pub poll_interval: Duration,
    /// Upper bound on a single cycle, if any
    pub cycle_timeout: Option<Duration>,
    /// How PRs are merged
    pub merge_method: MergeMethod,
    /// Failure messages that hold a candidate instead of rejecting it
    pub hold_messages: Vec<String>,
    /// Body of automatic re-approval reviews
    pub reapprove_message: String,
    /// Identity for rebased commits
    pub committer: Committer,
}

/// On-disk form; every field optional so env vars can fill the gaps
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    repository: Option<String>,
    host: Option<String>,
    remote: Option<String>,
    mirror_dir: Option<PathBuf>,
    ready_label: Option<String>,
    rejected_label: Option<String>,
    poll_interval_secs: Option<u64>,
    cycle_timeout_secs: Option<u64>,
    merge_method: Option<MergeMethod>,
    /// Replaces the default hold list when present
    hold_messages: Option<Vec<String>>,
    reapprove_message: Option<String>,
    committer_name: Option<String>,
    committer_email: Option<String>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

impl QueueConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the environment
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let file = match var("MERGEBOT_CONFIG") {
            Some(path) => ConfigFile::read(Path::new(&path))?,
            None => ConfigFile::default(),
        };

        let repository = var("MERGEBOT_REPOSITORY")
            .or(file.repository)
            .ok_or_else(|| {
                Error::Config(
                    "no repository configured; set MERGEBOT_REPOSITORY=owner/repo".to_string(),
                )
            })?;
        let mut platform = parse_repo_info(&repository)?;
        if let Some(host) = var("MERGEBOT_HOST").or(file.host) {
            platform.host = Some(host).filter(|h| h != "github.com");
        }

        let mirror_dir = match var("MERGEBOT_MIRROR_DIR").map(PathBuf::from).or(file.mirror_dir) {
            Some(dir) => dir,
            None => default_mirror_dir(&platform)?,
        };

        let poll_interval_secs = match var("MERGEBOT_POLL_INTERVAL_SECS") {
            Some(raw) => parse_secs("MERGEBOT_POLL_INTERVAL_SECS", &raw)?,
            None => file.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        };
        if poll_interval_secs == 0 {
            return Err(Error::Config("poll interval must be at least 1 second".to_string()));
        }

        let cycle_timeout_secs = match var("MERGEBOT_CYCLE_TIMEOUT_SECS") {
            Some(raw) => Some(parse_secs("MERGEBOT_CYCLE_TIMEOUT_SECS", &raw)?),
            None => file.cycle_timeout_secs,
        };
        if cycle_timeout_secs == Some(0) {
            return Err(Error::Config(
                "cycle timeout must be at least 1 second; omit it to disable".to_string(),
            ));
        }

        let merge_method = match var("MERGEBOT_MERGE_METHOD") {
            Some(raw) => raw.parse::<MergeMethod>().map_err(Error::Config)?,
            None => file.merge_method.unwrap_or_default(),
        };

        let mut hold_messages = file
            .hold_messages
            .unwrap_or_else(|| vec![DEFAULT_HOLD_MESSAGE.to_string()]);
        if let Some(extra) = var("MERGEBOT_HOLD_MESSAGES") {
            hold_messages.extend(
                extra
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            );
        }

        let ready_label = var("MERGEBOT_READY_LABEL")
            .or(file.ready_label)
            .unwrap_or_else(|| DEFAULT_READY_LABEL.to_string());
        let rejected_label = var("MERGEBOT_REJECTED_LABEL")
            .or(file.rejected_label)
            .unwrap_or_else(|| DEFAULT_REJECTED_LABEL.to_string());
        if ready_label == rejected_label {
            return Err(Error::Config(format!(
                "ready and rejected labels must differ (both '{ready_label}')"
            )));
        }

        Ok(Self {
            platform,
            remote: var("MERGEBOT_REMOTE")
                .or(file.remote)
                .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            mirror_dir,
            ready_label,
            rejected_label,
            poll_interval: Duration::from_secs(poll_interval_secs),
            cycle_timeout: cycle_timeout_secs.map(Duration::from_secs),
            merge_method,
            hold_messages,
            reapprove_message: file
                .reapprove_message
                .unwrap_or_else(|| DEFAULT_REAPPROVE_MESSAGE.to_string()),
            committer: Committer {
                name: var("MERGEBOT_COMMITTER_NAME")
                    .or(file.committer_name)
                    .unwrap_or_else(|| "mergebot".to_string()),
                email: var("MERGEBOT_COMMITTER_EMAIL")
                    .or(file.committer_email)
                    .unwrap_or_else(|| "mergebot@users.noreply.github.com".to_string()),
            },
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}: '{raw}' is not a number of seconds: {e}")))
}

fn default_mirror_dir(platform: &PlatformConfig) -> Result<PathBuf> {
    let base = dirs::data_local_dir().ok_or_else(|| {
        Error::Config("no data directory on this platform; set MERGEBOT_MIRROR_DIR".to_string())
    })?;
    Ok(base
        .join("mergebot")
        .join(&platform.owner)
        .join(&platform.repo))
}
