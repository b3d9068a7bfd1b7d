//! The upsert orchestrator tying resolver, locator, and store together.

use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::comment_locator::locate_tracked_comment;
use crate::comment_marker::{format_marker, TrackerTag};
use crate::comment_store::{CommentStore, IssueResolver, TransportError};
use crate::metadata_codec::MetadataCodec;

#[derive(Debug, Error)]
/// Enumerates the ways an upsert can fail.
pub enum UpsertError<E> {
    #[error("no issue or pull request is associated with the current run")]
    IssueNotFound,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to encode tracker metadata: {0}")]
    EncodeMetadata(#[source] serde_json::Error),
    #[error("comment create step failed: {0}")]
    Create(E),
}

/// Maintains the single tracked comment for one tag on whatever issue the
/// resolver yields.
///
/// ```no_run
/// # use serde::{Deserialize, Serialize};
/// # use waymark_core::{CommentTracker, IssueRef, TrackerTag, UpsertError};
/// #[derive(Serialize, Deserialize)]
/// struct DeployMeta {
///     deployment_id: String,
/// }
///
/// # async fn example(store: impl waymark_core::CommentStore) -> Result<(), UpsertError<std::convert::Infallible>> {
/// let issue = IssueRef {
///     owner: "octocat".into(),
///     repo: "hello-world".into(),
///     number: 42,
/// };
/// let tracker = CommentTracker::new(
///     TrackerTag::parse("DeploymentService").unwrap(),
///     issue,
///     store,
/// );
///
/// let url = tracker
///     .upsert(|previous: Option<DeployMeta>| async move {
///         let body = match previous {
///             Some(meta) => format!("Redeployed (was {}).", meta.deployment_id),
///             None => "First deployment.".to_string(),
///         };
///         let meta = DeployMeta {
///             deployment_id: "deploy-123".into(),
///         };
///         Ok((body, meta, "https://example.com/deploy-123".to_string()))
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct CommentTracker<M, R, S> {
    tag: TrackerTag,
    resolver: R,
    store: S,
    _metadata: PhantomData<fn() -> M>,
}

impl<M, R, S> CommentTracker<M, R, S>
where
    M: Serialize + DeserializeOwned,
    R: IssueResolver,
    S: CommentStore,
{
    pub fn new(tag: TrackerTag, resolver: R, store: S) -> Self {
        Self {
            tag,
            resolver,
            store,
            _metadata: PhantomData,
        }
    }

    pub fn tag(&self) -> &TrackerTag {
        &self.tag
    }

    /// Creates or updates the tracked comment.
    ///
    /// Resolves the current issue (failing fast with [`UpsertError::IssueNotFound`]
    /// before any comment is fetched), locates the previously tracked comment,
    /// and runs `create` exactly once with its decoded metadata, if any.
    /// `create` returns the new body markdown, the new metadata to embed, and
    /// a passthrough value handed back to the caller. A located comment is
    /// updated in place with its entire body replaced; otherwise a new comment
    /// is created. Exactly one write happens per successful call, and a write
    /// always happens, even when the new content equals the old.
    ///
    /// Errors from `create` are propagated unchanged and no write is
    /// attempted. Transport failures from listing or writing surface as
    /// [`UpsertError::Transport`].
    ///
    /// The locate-then-write sequence is not atomic. Two concurrent upserts
    /// for the same tag and issue can both observe "not found" and create
    /// duplicate comments (the earlier one then wins every later locate, and
    /// nothing deletes the extra). Callers must serialize upsert calls per
    /// tag and issue.
    #[instrument(skip_all, fields(tag = %self.tag))]
    pub async fn upsert<F, Fut, A, E>(&self, create: F) -> Result<A, UpsertError<E>>
    where
        F: FnOnce(Option<M>) -> Fut,
        Fut: Future<Output = Result<(String, M, A), E>>,
    {
        let issue = self
            .resolver
            .current_issue()
            .await
            .ok_or(UpsertError::IssueNotFound)?;

        let previous = locate_tracked_comment(&self.store, &issue, &self.tag).await?;
        let (previous_comment, previous_meta) = match previous {
            Some((comment, meta)) => (Some(comment), Some(meta)),
            None => (None, None),
        };

        let (body, meta, passthrough) =
            create(previous_meta).await.map_err(UpsertError::Create)?;

        let payload = MetadataCodec::encode(&meta).map_err(UpsertError::EncodeMetadata)?;
        let full_body = format!("{}\n{body}", format_marker(&self.tag, &payload));

        match previous_comment {
            None => {
                tracing::info!(%issue, "creating tracked comment");
                self.store.create_comment(&issue, &full_body).await?;
            }
            Some(comment) => {
                tracing::info!(%issue, comment_id = comment.id, "updating tracked comment");
                self.store
                    .update_comment(&issue, comment.id, &full_body)
                    .await?;
            }
        }

        Ok(passthrough)
    }
}
