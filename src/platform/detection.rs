//! Repository spec parsing

use crate::error::{Error, Result};
use crate::types::PlatformConfig;
use url::Url;

/// Parse `owner/repo`, an HTTPS URL, or an SSH remote into a [`PlatformConfig`].
///
/// Hosts other than `github.com` are kept as GitHub Enterprise hosts.
pub fn parse_repo_info(spec: &str) -> Result<PlatformConfig> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(Error::InvalidRepoSpec("empty repository".to_string()));
    }

    let (host, path) = if let Some(rest) = spec.strip_prefix("git@") {
        // git@host:owner/repo.git
        let (host, path) = rest
            .split_once(':')
            .ok_or_else(|| Error::InvalidRepoSpec(spec.to_string()))?;
        (Some(host.to_string()), path.to_string())
    } else if spec.contains("://") {
        let url = Url::parse(spec).map_err(|e| Error::InvalidRepoSpec(format!("{spec}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidRepoSpec(format!("{spec}: missing host")))?;
        (Some(host.to_string()), url.path().to_string())
    } else {
        (None, spec.to_string())
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::InvalidRepoSpec(format!(
            "{spec}: expected owner/repo"
        )));
    };

    Ok(PlatformConfig {
        owner: owner.to_string(),
        repo: repo.to_string(),
        host: host.filter(|h| h != "github.com"),
    })
}
