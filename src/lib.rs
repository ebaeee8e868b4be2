//! mergebot - a single-candidate merge queue for GitHub pull requests
//!
//! Each poll cycle picks at most one ready-labeled pull request, merges it
//! when it is based on the target branch's tip, and otherwise rebases and
//! force-pushes it, re-approving if it was approved. Permanent failures
//! label the PR rejected; known transient ones leave it queued.

pub mod auth;
pub mod config;
pub mod daemon;
pub mod error;
pub mod platform;
pub mod queue;
pub mod types;
pub mod vcs;
