//! Issue resolution from the GitHub Actions runner environment.
//!
//! A workflow run exposes the repository as `GITHUB_REPOSITORY` and the
//! triggering webhook payload as a JSON file at `GITHUB_EVENT_PATH`. Both
//! `issues` and `pull_request` events carry the number the tracker needs;
//! runs triggered by anything else (a push, a schedule) resolve to no issue.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use waymark_core::{IssueRef, IssueResolver};

pub const REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
pub const EVENT_PATH_ENV: &str = "GITHUB_EVENT_PATH";

/// Resolves the issue or pull request a workflow run is attached to.
///
/// The runner environment is read once at construction; resolution failures
/// of any kind (missing variables, unreadable payload, an event without an
/// issue) surface as `current_issue() == None` rather than errors.
pub struct ActionsEventResolver {
    issue: Option<IssueRef>,
}

impl ActionsEventResolver {
    pub fn from_env() -> Self {
        Self::from_sources(
            std::env::var(REPOSITORY_ENV).ok(),
            std::env::var(EVENT_PATH_ENV).ok().map(PathBuf::from),
        )
    }

    pub fn from_sources(repository: Option<String>, event_path: Option<PathBuf>) -> Self {
        let payload = event_path
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
        Self {
            issue: resolve_issue(repository.as_deref(), payload.as_ref()),
        }
    }

    pub fn resolved(&self) -> Option<&IssueRef> {
        self.issue.as_ref()
    }
}

#[async_trait]
impl IssueResolver for ActionsEventResolver {
    async fn current_issue(&self) -> Option<IssueRef> {
        self.issue.clone()
    }
}

/// Combines an `owner/repo` string with a webhook payload into an issue ref.
pub fn resolve_issue(repository: Option<&str>, payload: Option<&Value>) -> Option<IssueRef> {
    let repository = repository?.trim();
    let (owner, repo) = repository.split_once('/')?;
    let (owner, repo) = (owner.trim(), repo.trim());
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    let payload = payload?;
    let number = payload
        .pointer("/issue/number")
        .or_else(|| payload.pointer("/pull_request/number"))
        .and_then(Value::as_u64)?;
    Some(IssueRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    })
}
