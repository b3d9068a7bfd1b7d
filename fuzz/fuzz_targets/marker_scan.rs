#![no_main]

use libfuzzer_sys::fuzz_target;
use waymark_core::{find_marker, scan_comment_body, MarkerScan, TrackerTag};

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);

    // The structured scanner must never panic and any marker it returns must
    // hold the shape it promises.
    if let Some(marker) = find_marker(&body) {
        assert!(!marker.tag.is_empty());
        assert!(!marker.payload.is_empty());
        assert!(marker
            .tag
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_'));
        assert!(!marker.payload.chars().any(char::is_whitespace));
    }

    // Arbitrary input must classify, never error out of the scan.
    let tag = TrackerTag::parse("fuzz").expect("static tag");
    match scan_comment_body::<serde_json::Value>(&tag, &body) {
        MarkerScan::NoMarker
        | MarkerScan::ForeignTag
        | MarkerScan::UndecodablePayload(_)
        | MarkerScan::Match(_) => {}
    }
});
