// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The content a device is configured to display.
//!
//! An [`Assignment`] is replaced wholesale whenever the server-side descriptor
//! changes. Playlist and single-media assignments are exclusive by
//! construction: there is exactly one active variant.

use crate::media::{FileType, MediaItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Display time for images that carry no duration of their own.
pub const DEFAULT_IMAGE_SECS: u32 = 10;

/// Which kind of content an assignment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Playlist,
    Media,
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Playlist => "playlist",
            Self::Media => "media",
        })
    }
}

/// Change-detection key: `(kind, id, last_updated)`.
///
/// Comparing on `id` alone misses in-place edits (e.g. reordered playlist
/// items), so the timestamp is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentKey {
    pub kind: AssignmentKind,
    pub id: i64,
    pub last_updated: Option<String>,
}

impl AssignmentKey {
    pub fn new(kind: AssignmentKind, id: i64, last_updated: Option<String>) -> Self {
        Self { kind, id, last_updated }
    }
}

impl fmt::Display for AssignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.kind, self.id, self.last_updated.as_deref().unwrap_or("-"))
    }
}

/// Whether the remote descriptor differs from what is currently applied.
///
/// `None` on either side means "no assignment".
pub fn key_changed(current: Option<&AssignmentKey>, remote: Option<&AssignmentKey>) -> bool {
    current != remote
}

/// An ordered, server-defined sequence of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub default_duration: Option<u32>,
    pub last_updated: Option<String>,
    pub items: Vec<MediaItem>,
}

/// A single item assigned directly to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleMedia {
    pub item: MediaItem,
    pub last_updated: Option<String>,
}

/// What this screen should show.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    #[default]
    None,
    Playlist(Playlist),
    SingleMedia(SingleMedia),
}

impl Assignment {
    pub fn key(&self) -> Option<AssignmentKey> {
        match self {
            Self::None => None,
            Self::Playlist(p) => {
                Some(AssignmentKey::new(AssignmentKind::Playlist, p.id, p.last_updated.clone()))
            }
            Self::SingleMedia(m) => {
                Some(AssignmentKey::new(AssignmentKind::Media, m.item.id, m.last_updated.clone()))
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Items in playback order. A single-media assignment is a one-item sequence.
    pub fn items(&self) -> &[MediaItem] {
        match self {
            Self::None => &[],
            Self::Playlist(p) => &p.items,
            Self::SingleMedia(m) => std::slice::from_ref(&m.item),
        }
    }

    /// Whether the player should repeat the sequence.
    ///
    /// Single media always loops.
    pub fn looping(&self) -> bool {
        match self {
            Self::None => false,
            Self::Playlist(p) => p.looping,
            Self::SingleMedia(_) => true,
        }
    }

    /// Display duration hint for `item`, in seconds.
    ///
    /// Images get the item override, then the playlist default, then
    /// [`DEFAULT_IMAGE_SECS`]. Videos and streams use their intrinsic length
    /// and return `None`.
    pub fn display_secs(&self, item: &MediaItem) -> Option<u32> {
        if item.file_type != FileType::Image || item.is_stream {
            return None;
        }
        let playlist_default = match self {
            Self::Playlist(p) => p.default_duration,
            _ => None,
        };
        Some(
            item.duration
                .filter(|d| *d > 0)
                .or(playlist_default.filter(|d| *d > 0))
                .unwrap_or(DEFAULT_IMAGE_SECS),
        )
    }

    /// Cache filenames this assignment needs kept on disk.
    pub fn referenced_files(&self) -> BTreeSet<String> {
        self.items()
            .iter()
            .filter(|item| !item.is_stream)
            .filter_map(|item| item.cache_name().ok().map(str::to_string))
            .collect()
    }

    /// Name reported as `current_media` in telemetry.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Playlist(p) => Some(p.name.as_str()),
            Self::SingleMedia(m) => Some(m.item.display_name()),
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Playlist(p) => write!(f, "playlist {} ({:?}, {} items)", p.id, p.name, p.items.len()),
            Self::SingleMedia(m) => write!(f, "media {} ({:?})", m.item.id, m.item.display_name()),
        }
    }
}

#[cfg(test)]
#[path = "assignment_tests.rs"]
mod tests;
