// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playback manifest: the full resolved sequence handed to the player in a
//! single invocation.
//!
//! A single-item assignment produces a one-entry manifest; there is no
//! separate code path for it.

use crate::media::PlaybackSource;
use std::fmt::Write as _;

/// One playable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub title: String,
    pub source: PlaybackSource,
    /// Fixed display time in seconds; `None` means intrinsic duration.
    pub display_secs: Option<u32>,
}

impl ManifestEntry {
    pub fn new(title: impl Into<String>, source: PlaybackSource, display_secs: Option<u32>) -> Self {
        Self { title: title.into(), source, display_secs }
    }
}

/// Ordered list of entries plus the loop flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    looping: bool,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>, looping: bool) -> Self {
        Self { entries, looping }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Render as extended M3U.
    ///
    /// Entries with a fixed display time carry both a `#EXTINF` length and a
    /// `#EXTVLCOPT:image-duration` option; intrinsic-length entries use `-1`.
    pub fn to_m3u(&self) -> String {
        let mut out = String::from("#EXTM3U\n");
        for entry in &self.entries {
            let secs = entry.display_secs.map(i64::from).unwrap_or(-1);
            let title = entry.title.replace(['\n', '\r'], " ");
            let _ = writeln!(out, "#EXTINF:{secs},{title}");
            if let Some(d) = entry.display_secs {
                let _ = writeln!(out, "#EXTVLCOPT:image-duration={d}");
            }
            let _ = writeln!(out, "{}", entry.source);
        }
        out
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
