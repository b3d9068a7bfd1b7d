//! Tracked-comment upserts for GitHub issues and pull requests.
//!
//! A recurring automation (a deployment bot, a report generator) posts one
//! comment per issue and keeps rewriting it in place. The comment opens with
//! a marker line naming the tracker and carrying base64 JSON metadata, so the
//! next run can find its own previous output and read back the state it wrote
//! last time. The issue itself is the only store.

pub mod comment_locator;
pub mod comment_marker;
pub mod comment_store;
pub mod comment_tracker;
pub mod metadata_codec;


pub use comment_locator::{locate_tracked_comment, scan_comment_body, MarkerScan};
pub use comment_marker::{find_marker, format_marker, InvalidTagError, RawMarker, TrackerTag};
pub use comment_store::{
    CommentPage, CommentStore, IssueComment, IssueRef, IssueResolver, TransportError,
};
pub use comment_tracker::{CommentTracker, UpsertError};
pub use metadata_codec::{MetadataCodec, MetadataDecodeError};
