//! Locating the tracked comment among an issue's comments.
//!
//! Comment histories are unbounded, so pages are pulled one at a time and the
//! scan stops at the first match. Decode-level failures are classified per
//! stage for inspection but always collapse to "not a match, keep scanning";
//! only transport failures abort the scan.

use serde::de::DeserializeOwned;

use crate::comment_marker::{find_marker, TrackerTag};
use crate::comment_store::{CommentStore, IssueComment, IssueRef, TransportError};
use crate::metadata_codec::{MetadataCodec, MetadataDecodeError};

/// Outcome of scanning one comment body for this tracker's marker.
#[derive(Debug)]
pub enum MarkerScan<M> {
    /// No well-formed marker anywhere in the body.
    NoMarker,
    /// The first well-formed marker belongs to a different tracker.
    ForeignTag,
    /// The marker matched the tag but its payload did not decode.
    UndecodablePayload(MetadataDecodeError),
    Match(M),
}

/// Classifies `body` against `tag`.
///
/// Exactly one marker is recognized per comment: a first well-formed marker
/// with a foreign tag ends the scan for that comment even if a matching
/// marker appears later in the same body.
pub fn scan_comment_body<M>(tag: &TrackerTag, body: &str) -> MarkerScan<M>
where
    M: DeserializeOwned,
{
    let Some(marker) = find_marker(body) else {
        return MarkerScan::NoMarker;
    };
    if marker.tag != tag.as_str() {
        return MarkerScan::ForeignTag;
    }
    match MetadataCodec::decode(marker.payload) {
        Ok(meta) => MarkerScan::Match(meta),
        Err(error) => MarkerScan::UndecodablePayload(error),
    }
}

/// Finds the first comment carrying a decodable marker for `tag`.
///
/// Pages are fetched in ascending order and comments scanned in listing
/// order; the first match short-circuits the remaining pages. Exhausting all
/// pages without a match yields `Ok(None)`.
pub async fn locate_tracked_comment<M, S>(
    store: &S,
    issue: &IssueRef,
    tag: &TrackerTag,
) -> Result<Option<(IssueComment, M)>, TransportError>
where
    M: DeserializeOwned,
    S: CommentStore + ?Sized,
{
    let mut page = 1_u32;
    loop {
        let batch = store.list_comments(issue, page).await?;
        for comment in batch.items {
            let body = comment.body.as_deref().unwrap_or("");
            if let MarkerScan::Match(meta) = scan_comment_body(tag, body) {
                tracing::debug!(%issue, comment_id = comment.id, page, "found tracked comment");
                return Ok(Some((comment, meta)));
            }
        }
        if !batch.has_next_page {
            tracing::debug!(%issue, pages = page, "no tracked comment found");
            return Ok(None);
        }
        page = page.saturating_add(1);
    }
}
