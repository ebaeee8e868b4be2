//! GitHub credential resolution

use super::AuthSource;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use tokio::process::Command;
use tracing::debug;

/// Username git uses with a token over HTTPS when none is configured
const DEFAULT_USERNAME: &str = "x-access-token";

/// Credentials for both the GitHub API and the git remote.
///
/// Resolved once per cycle and passed explicitly to every call that needs
/// them. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username for git over HTTPS
    pub username: String,
    /// Personal access or installation token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

impl Credentials {
    /// Value for an HTTP `Authorization` header (basic auth)
    pub fn basic_auth_header(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.token));
        format!("Authorization: Basic {encoded}")
    }

    /// Replace any occurrence of the secret material in `text`
    pub fn redact(&self, text: &str) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.token));
        text.replace(&encoded, "[REDACTED]")
            .replace(&self.token, "[REDACTED]")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve credentials from environment variables only.
///
/// Checks `GITHUB_TOKEN`, then `GH_TOKEN`. `MERGEBOT_USERNAME` overrides the
/// git username.
pub fn get_github_auth_with<F>(lookup: F) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let token = ["GITHUB_TOKEN", "GH_TOKEN"]
        .into_iter()
        .filter_map(&lookup)
        .find(|t| !t.trim().is_empty())?;

    let username = lookup("MERGEBOT_USERNAME")
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

    Some(Credentials {
        username,
        token: token.trim().to_string(),
        source: AuthSource::EnvVar,
    })
}

/// Resolve GitHub credentials from the environment, falling back to `gh auth token`
pub async fn get_github_auth() -> Result<Credentials> {
    if let Some(creds) = get_github_auth_with(|key| std::env::var(key).ok()) {
        debug!(source = ?creds.source, "using GitHub token from environment");
        return Ok(creds);
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .map_err(|e| Error::Auth(format!("no GITHUB_TOKEN set and gh CLI unavailable: {e}")))?;

    if !output.status.success() {
        return Err(Error::Auth(
            "no GITHUB_TOKEN set and `gh auth token` failed; run 'gh auth login'".to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("`gh auth token` returned an empty token".to_string()));
    }

    debug!("using GitHub token from gh CLI");
    Ok(Credentials {
        username: std::env::var("MERGEBOT_USERNAME")
            .unwrap_or_else(|_| DEFAULT_USERNAME.to_string()),
        token,
        source: AuthSource::Cli,
    })
}
