//! In-memory version control for testing
//!
//! Commits are named by short strings and linked to their parents; refs map
//! names to commits. Rebases either follow a scripted outcome or "succeed"
//! by minting a new commit on top of the upstream.

#![allow(dead_code)]

use super::Timeline;
use async_trait::async_trait;
use mergebot::auth::Credentials;
use mergebot::error::{Error, Result};
use mergebot::types::{CommitId, RebaseOutcome, RebaseStatus};
use mergebot::vcs::VersionControl;
use std::collections::HashMap;
use std::sync::Mutex;

/// Everything the queue asked the VCS to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Fetch { remote: String },
    Checkout { commit: CommitId },
    Rebase { upstream: String },
    AbortRebase,
    ForcePush { remote: String, branch: String },
}

#[derive(Default)]
pub struct MockVcs {
    parents: Mutex<HashMap<CommitId, Vec<CommitId>>>,
    refs: Mutex<HashMap<String, CommitId>>,
    head: Mutex<Option<CommitId>>,
    rebase_response: Mutex<Option<RebaseOutcome>>,
    calls: Mutex<Vec<VcsCall>>,
    parent_lookups: Mutex<usize>,
    error_on_fetch: Mutex<Option<String>>,
    error_on_push: Mutex<Option<String>>,
    timeline: Timeline,
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit with the given parents
    pub fn commit(self, id: &str, parents: &[&str]) -> Self {
        self.parents.lock().unwrap().insert(
            CommitId::from(id),
            parents.iter().map(|p| CommitId::from(*p)).collect(),
        );
        self
    }

    /// Log calls into `timeline` as well as the mock's own call list
    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// Point a ref at a commit
    pub fn with_ref(self, name: &str, commit: &str) -> Self {
        self.set_ref(name, commit);
        self
    }

    pub fn set_ref(&self, name: &str, commit: &str) {
        self.refs
            .lock()
            .unwrap()
            .insert(name.to_string(), CommitId::from(commit));
    }

    /// Make the next rebase stop with `status`
    pub fn conflict_on_rebase(&self, status: RebaseStatus) {
        *self.rebase_response.lock().unwrap() = Some(RebaseOutcome::Conflict(status));
    }

    pub fn fail_fetch(&self, msg: &str) {
        *self.error_on_fetch.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_push(&self, msg: &str) {
        *self.error_on_push.lock().unwrap() = Some(msg.to_string());
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn parent_lookups(&self) -> usize {
        *self.parent_lookups.lock().unwrap()
    }

    pub fn pushes(&self) -> Vec<VcsCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, VcsCall::ForcePush { .. }))
            .collect()
    }

    pub fn rebases(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, VcsCall::Rebase { .. }))
            .count()
    }

    fn record(&self, call: VcsCall) {
        self.timeline.record(match &call {
            VcsCall::Fetch { .. } => "fetch",
            VcsCall::Checkout { .. } => "checkout",
            VcsCall::Rebase { .. } => "rebase",
            VcsCall::AbortRebase => "abort_rebase",
            VcsCall::ForcePush { .. } => "force_push",
        });
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, spec: &str) -> Option<CommitId> {
        if let Some(id) = self.refs.lock().unwrap().get(spec) {
            return Some(id.clone());
        }
        let id = CommitId::from(spec);
        self.parents.lock().unwrap().contains_key(&id).then_some(id)
    }
}

#[async_trait]
impl VersionControl for MockVcs {
    async fn fetch(&self, remote: &str, _credentials: &Credentials) -> Result<()> {
        self.record(VcsCall::Fetch {
            remote: remote.to_string(),
        });
        if let Some(msg) = self.error_on_fetch.lock().unwrap().as_ref() {
            return Err(Error::Git(msg.clone()));
        }
        Ok(())
    }

    async fn checkout(&self, commit: &CommitId) -> Result<()> {
        self.record(VcsCall::Checkout {
            commit: commit.clone(),
        });
        let resolved = self
            .lookup(commit.as_str())
            .ok_or_else(|| Error::UnresolvableRef(commit.to_string()))?;
        *self.head.lock().unwrap() = Some(resolved);
        Ok(())
    }

    async fn rebase(&self, upstream: &str) -> Result<RebaseOutcome> {
        self.record(VcsCall::Rebase {
            upstream: upstream.to_string(),
        });
        if let Some(outcome) = self.rebase_response.lock().unwrap().take() {
            return Ok(outcome);
        }

        let onto = self
            .lookup(upstream)
            .ok_or_else(|| Error::UnresolvableRef(upstream.to_string()))?;
        let old_head = self
            .head
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Git("nothing checked out".to_string()))?;
        let new_head = CommitId::new(format!("{old_head}-rebased"));
        self.parents
            .lock()
            .unwrap()
            .insert(new_head.clone(), vec![onto]);
        *self.head.lock().unwrap() = Some(new_head.clone());
        Ok(RebaseOutcome::Clean(new_head))
    }

    async fn abort_rebase(&self) -> Result<()> {
        self.record(VcsCall::AbortRebase);
        Ok(())
    }

    async fn force_push(
        &self,
        remote: &str,
        branch: &str,
        _credentials: &Credentials,
    ) -> Result<()> {
        self.record(VcsCall::ForcePush {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        if let Some(msg) = self.error_on_push.lock().unwrap().as_ref() {
            return Err(Error::Git(msg.clone()));
        }
        Ok(())
    }

    async fn resolve(&self, spec: &str) -> Result<CommitId> {
        self.lookup(spec)
            .ok_or_else(|| Error::UnresolvableRef(spec.to_string()))
    }

    async fn parents(&self, commit: &CommitId) -> Result<Vec<CommitId>> {
        *self.parent_lookups.lock().unwrap() += 1;
        self.parents
            .lock()
            .unwrap()
            .get(commit)
            .cloned()
            .ok_or_else(|| Error::UnresolvableRef(commit.to_string()))
    }
}
