// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Assignment, FileType, MediaItem, Playlist, SingleMedia};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for assignment keys and update sequences.
pub mod strategies {
    use crate::{AssignmentKey, AssignmentKind};
    use proptest::prelude::*;

    pub fn arb_kind() -> impl Strategy<Value = AssignmentKind> {
        prop_oneof![Just(AssignmentKind::Playlist), Just(AssignmentKind::Media)]
    }

    pub fn arb_key() -> impl Strategy<Value = AssignmentKey> {
        (arb_kind(), 1i64..6, proptest::option::of("T[0-3]"))
            .prop_map(|(kind, id, ts)| AssignmentKey::new(kind, id, ts))
    }

    pub fn arb_remote() -> impl Strategy<Value = Option<AssignmentKey>> {
        proptest::option::of(arb_key())
    }
}

// ── Fixture builders ────────────────────────────────────────────────────

pub fn image(id: i64, filename: &str) -> MediaItem {
    MediaItem {
        id,
        filename: filename.to_string(),
        original_filename: format!("orig-{filename}"),
        file_type: FileType::Image,
        is_stream: false,
        stream_url: None,
        url: Some(format!("http://media.test/uploads/{filename}")),
        duration: None,
    }
}

pub fn video(id: i64, filename: &str) -> MediaItem {
    MediaItem { file_type: FileType::Video, ..image(id, filename) }
}

pub fn stream(id: i64, url: &str) -> MediaItem {
    MediaItem {
        id,
        filename: String::new(),
        original_filename: format!("stream-{id}"),
        file_type: FileType::Video,
        is_stream: true,
        stream_url: Some(url.to_string()),
        url: None,
        duration: None,
    }
}

pub fn playlist(id: i64, last_updated: &str, items: Vec<MediaItem>) -> Assignment {
    Assignment::Playlist(Playlist {
        id,
        name: format!("playlist-{id}"),
        looping: true,
        default_duration: Some(10),
        last_updated: Some(last_updated.to_string()),
        items,
    })
}

pub fn single(item: MediaItem, last_updated: &str) -> Assignment {
    Assignment::SingleMedia(SingleMedia { item, last_updated: Some(last_updated.to_string()) })
}

/// Three images, `a.jpg`, `b.jpg`, `c.jpg`, in that order.
pub fn three_item_playlist(id: i64, last_updated: &str) -> Assignment {
    playlist(id, last_updated, vec![image(1, "a.jpg"), image(2, "b.jpg"), image(3, "c.jpg")])
}
