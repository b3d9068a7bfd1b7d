//! Marker syntax for tracked comments.
//!
//! A tracked comment opens with a single HTML-comment marker line,
//! `<!-- CommentTracker(<tag>) <payload> -->`, followed by one newline and
//! the human-readable body. The marker is invisible in rendered markdown but
//! survives round trips through the GitHub API byte for byte.

use std::fmt;

use thiserror::Error;

pub const MARKER_PREFIX: &str = "<!-- CommentTracker(";
pub const MARKER_SUFFIX: &str = " -->";
const TAG_TERMINATOR: &str = ") ";

/// Identifier separating independent trackers posting to the same issue.
///
/// Restricted to `[A-Za-z0-9_]` so a rendered marker always scans back to the
/// tag it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackerTag(String);

#[derive(Debug, Error)]
#[error("invalid tracker tag '{raw}': expected one or more of [A-Za-z0-9_]")]
pub struct InvalidTagError {
    raw: String,
}

impl TrackerTag {
    pub fn parse(raw: &str) -> Result<Self, InvalidTagError> {
        if raw.is_empty() || !raw.chars().all(is_tag_char) {
            return Err(InvalidTagError {
                raw: raw.to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_tag_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Tag and still-encoded payload of a marker found in a comment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMarker<'a> {
    pub tag: &'a str,
    pub payload: &'a str,
}

/// Renders the marker line for `tag` around an already-encoded payload.
pub fn format_marker(tag: &TrackerTag, payload: &str) -> String {
    format!("{MARKER_PREFIX}{tag}{TAG_TERMINATOR}{payload}{MARKER_SUFFIX}")
}

/// Returns the first fully formed marker in `body`, scanning left to right.
///
/// Candidates that open with the marker prefix but break off midway (bad tag
/// character, missing payload, missing terminator) are skipped so a later
/// well-formed marker is still found. At most one marker is ever returned;
/// anything after the first well-formed one is opaque body text.
pub fn find_marker(body: &str) -> Option<RawMarker<'_>> {
    let mut cursor = body;
    loop {
        let start = cursor.find(MARKER_PREFIX)?;
        let candidate = &cursor[start + MARKER_PREFIX.len()..];
        if let Some(marker) = parse_candidate(candidate) {
            return Some(marker);
        }
        cursor = candidate;
    }
}

fn parse_candidate(rest: &str) -> Option<RawMarker<'_>> {
    let tag_len = rest
        .find(|ch: char| !is_tag_char(ch))
        .unwrap_or(rest.len());
    if tag_len == 0 {
        return None;
    }
    let (tag, rest) = rest.split_at(tag_len);
    let rest = rest.strip_prefix(TAG_TERMINATOR)?;
    let payload_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
    if payload_len == 0 {
        return None;
    }
    let (payload, rest) = rest.split_at(payload_len);
    if !rest.starts_with(MARKER_SUFFIX) {
        return None;
    }
    Some(RawMarker { tag, payload })
}
