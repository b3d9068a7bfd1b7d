//! Collaborator interfaces the tracker runs against.
//!
//! Both collaborators are injected explicitly into `CommentTracker`; there is
//! no ambient registry. Implementations live outside this crate (see the
//! GitHub REST client in `waymark-github`), with in-memory fakes used in
//! tests.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of the issue or pull request a run posts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// The slice of a comment this crate reads. The REST API can return a null
/// body, so it is optional here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub body: Option<String>,
}

/// One page of comments in listing order, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    pub items: Vec<IssueComment>,
    pub has_next_page: bool,
}

#[derive(Debug, Error)]
/// Enumerates supported `TransportError` values.
pub enum TransportError {
    #[error("{operation} failed with status {status}: {detail}")]
    Status {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("{operation} failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[async_trait]
/// Trait contract for resolving the issue or pull request a run targets.
///
/// Returns `None` when the current context has no associated issue (a push
/// build, a scheduled run); that is a normal outcome, not a failure.
pub trait IssueResolver: Send + Sync {
    async fn current_issue(&self) -> Option<IssueRef>;
}

#[async_trait]
impl IssueResolver for IssueRef {
    async fn current_issue(&self) -> Option<IssueRef> {
        Some(self.clone())
    }
}

#[async_trait]
impl<T> IssueResolver for &T
where
    T: IssueResolver + ?Sized,
{
    async fn current_issue(&self) -> Option<IssueRef> {
        (**self).current_issue().await
    }
}

#[async_trait]
/// Trait contract for the comment collection behind an issue.
pub trait CommentStore: Send + Sync {
    async fn list_comments(
        &self,
        issue: &IssueRef,
        page: u32,
    ) -> Result<CommentPage, TransportError>;

    async fn create_comment(
        &self,
        issue: &IssueRef,
        body: &str,
    ) -> Result<IssueComment, TransportError>;

    async fn update_comment(
        &self,
        issue: &IssueRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, TransportError>;
}

#[async_trait]
impl<T> CommentStore for &T
where
    T: CommentStore + ?Sized,
{
    async fn list_comments(
        &self,
        issue: &IssueRef,
        page: u32,
    ) -> Result<CommentPage, TransportError> {
        (**self).list_comments(issue, page).await
    }

    async fn create_comment(
        &self,
        issue: &IssueRef,
        body: &str,
    ) -> Result<IssueComment, TransportError> {
        (**self).create_comment(issue, body).await
    }

    async fn update_comment(
        &self,
        issue: &IssueRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, TransportError> {
        (**self).update_comment(issue, comment_id, body).await
    }
}
