//! Git mirror backed by the git CLI (mutations) and gix (reads)

use super::VersionControl;
use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::types::{CommitId, RebaseOutcome, RebaseStatus};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Identity recorded as committer on rebased commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committer {
    /// Committer name
    pub name: String,
    /// Committer email
    pub email: String,
}

/// Result of looking for an existing mirror on disk
pub enum Procurement {
    /// A git repository already exists at the location
    Found(GitMirror),
    /// Nothing there yet; the caller decides whether to clone
    NotPresent,
}

/// A local clone the queue fetches, rebases and pushes from
pub struct GitMirror {
    dir: PathBuf,
    repo: gix::ThreadSafeRepository,
    committer: Committer,
}

impl GitMirror {
    /// Open the mirror at `dir` if one exists.
    ///
    /// A missing or empty directory is [`Procurement::NotPresent`]. A
    /// non-empty directory that is not a repository is an error, so the
    /// queue never clones over unrelated files.
    pub fn procure(dir: &Path, committer: Committer) -> Result<Procurement> {
        if dir.join(".git").exists() {
            let repo = gix::ThreadSafeRepository::open(dir)
                .map_err(|e| Error::Gix(format!("failed to open {}: {e}", dir.display())))?;
            debug!(dir = %dir.display(), "found existing mirror");
            return Ok(Procurement::Found(Self {
                dir: dir.to_path_buf(),
                repo,
                committer,
            }));
        }

        let is_empty = match std::fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if is_empty {
            Ok(Procurement::NotPresent)
        } else {
            Err(Error::Git(format!(
                "{} exists but is not a git repository",
                dir.display()
            )))
        }
    }

    /// Clone `url` into `dir` and open it
    pub async fn clone_into(
        url: &str,
        dir: &Path,
        credentials: &Credentials,
        committer: Committer,
    ) -> Result<Self> {
        info!(url, dir = %dir.display(), "cloning mirror");
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let output = Command::new("git")
            .env("GIT_TERMINAL_PROMPT", "0")
            .args(["-c", &format!("http.extraHeader={}", credentials.basic_auth_header())])
            .args(["clone", "--no-checkout", url])
            .arg(dir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Git(format!(
                "git clone failed: {}",
                credentials.redact(String::from_utf8_lossy(&output.stderr).trim())
            )));
        }

        match Self::procure(dir, committer)? {
            Procurement::Found(mirror) => Ok(mirror),
            Procurement::NotPresent => Err(Error::Git(format!(
                "clone reported success but {} is empty",
                dir.display()
            ))),
        }
    }

    /// Location of the mirror's working copy
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Run git in the mirror and return the raw output
    async fn run(&self, args: &[&str], credentials: Option<&Credentials>) -> Result<Output> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .args(["-c", &format!("user.name={}", self.committer.name)])
            .args(["-c", &format!("user.email={}", self.committer.email)]);
        if let Some(creds) = credentials {
            cmd.args(["-c", &format!("http.extraHeader={}", creds.basic_auth_header())]);
        }
        cmd.args(args);

        Ok(cmd.output().await?)
    }

    /// Run git and fail unless it exits successfully
    async fn run_ok(&self, args: &[&str], credentials: Option<&Credentials>) -> Result<String> {
        let output = self.run(args, credentials).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = credentials.map_or_else(|| stderr.to_string(), |c| c.redact(&stderr));
            return Err(Error::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn rebase_in_progress(&self) -> bool {
        let git_dir = self.dir.join(".git");
        git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists()
    }

    async fn conflicted_paths(&self) -> Result<Vec<String>> {
        let out = self
            .run_ok(&["diff", "--name-only", "--diff-filter=U"], None)
            .await?;
        Ok(out.lines().map(str::to_string).collect())
    }
}

#[async_trait]
impl VersionControl for GitMirror {
    async fn fetch(&self, remote: &str, credentials: &Credentials) -> Result<()> {
        debug!(remote, "fetching");
        let branches = format!("+refs/heads/*:refs/remotes/{remote}/*");
        let pull_heads = format!("+{PULL_HEADS}:{}", pull_heads_ref(remote));
        self.run_ok(
            &["fetch", "--prune", remote, &branches, &pull_heads],
            Some(credentials),
        )
        .await?;
        Ok(())
    }

    async fn checkout(&self, commit: &CommitId) -> Result<()> {
        if self.rebase_in_progress() {
            warn!("leftover rebase found in mirror, aborting it");
            self.abort_rebase().await?;
        }
        debug!(commit = commit.short(), "checking out");
        self.run_ok(&["checkout", "--force", "--detach", commit.as_str()], None)
            .await?;
        Ok(())
    }

    async fn rebase(&self, upstream: &str) -> Result<RebaseOutcome> {
        debug!(upstream, "rebasing");
        let output = self.run(&["rebase", upstream], None).await?;

        if output.status.success() {
            let head = self.resolve("HEAD").await?;
            debug!(head = head.short(), "rebase clean");
            return Ok(RebaseOutcome::Clean(head));
        }

        let paths = self.conflicted_paths().await?;
        let status = if paths.is_empty() && !self.rebase_in_progress() {
            RebaseStatus::Failed(String::from_utf8_lossy(&output.stderr).trim().to_string())
        } else {
            RebaseStatus::Conflict { paths }
        };
        debug!(%status, "rebase stopped");
        Ok(RebaseOutcome::Conflict(status))
    }

    async fn abort_rebase(&self) -> Result<()> {
        if !self.rebase_in_progress() {
            return Ok(());
        }
        debug!("aborting rebase");
        self.run_ok(&["rebase", "--abort"], None).await?;
        Ok(())
    }

    async fn force_push(
        &self,
        remote: &str,
        branch: &str,
        credentials: &Credentials,
    ) -> Result<()> {
        debug!(remote, branch, "force-pushing");
        let refspec = format!("HEAD:refs/heads/{branch}");
        self.run_ok(&["push", "--force", remote, &refspec], Some(credentials))
            .await?;
        Ok(())
    }

    async fn resolve(&self, spec: &str) -> Result<CommitId> {
        let repo = self.repo.to_thread_local();
        let peeled = format!("{spec}^{{commit}}");
        let id = repo
            .rev_parse_single(peeled.as_str())
            .map_err(|_| Error::UnresolvableRef(spec.to_string()))?;
        Ok(CommitId::new(id.to_string()))
    }

    async fn parents(&self, commit: &CommitId) -> Result<Vec<CommitId>> {
        let repo = self.repo.to_thread_local();
        let found = repo
            .find_commit(object_id(commit)?)
            .map_err(|_| Error::UnresolvableRef(commit.to_string()))?;
        Ok(found
            .parent_ids()
            .map(|p| CommitId::new(p.to_string()))
            .collect())
    }

    async fn ancestors(&self, start: &CommitId) -> Result<HashSet<CommitId>> {
        let repo = self.repo.to_thread_local();
        let tip = object_id(start)?;
        repo.find_commit(tip)
            .map_err(|_| Error::UnresolvableRef(start.to_string()))?;

        let walk = repo
            .rev_walk([tip])
            .all()
            .map_err(|e| Error::Gix(format!("cannot walk history of {}: {e}", start.short())))?;

        let mut seen = HashSet::new();
        for info in walk {
            let info = info
                .map_err(|e| Error::Gix(format!("cannot walk history of {}: {e}", start.short())))?;
            seen.insert(CommitId::new(info.id.to_string()));
        }
        debug!(start = start.short(), count = seen.len(), "walked ancestors");
        Ok(seen)
    }
}

fn object_id(commit: &CommitId) -> Result<gix::ObjectId> {
    gix::ObjectId::from_hex(commit.as_str().as_bytes())
        .map_err(|_| Error::UnresolvableRef(commit.to_string()))
}

/// Remote refs holding every pull request's head, including PRs from forks
const PULL_HEADS: &str = "refs/pull/*/head";

/// Local namespace the pull request heads of `remote` are fetched into
fn pull_heads_ref(remote: &str) -> String {
    format!("refs/pull/{remote}/*")
}
