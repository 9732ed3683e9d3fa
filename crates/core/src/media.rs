// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Media items and their resolved playback form.
//!
//! A [`MediaItem`] is what the server assigns; a [`PlaybackSource`] is what
//! the player is handed after the cache has done its work. Downloadable items
//! are identified by `filename`. Streams have no local identity and are
//! passed through as URLs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// URL schemes accepted for pass-through streams.
pub const STREAM_SCHEMES: &[&str] = &["http", "https", "rtmp", "rtmps", "rtsp"];

/// Errors describing an item that cannot be turned into a playback source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("stream item has no url")]
    MissingStreamUrl,
    #[error("unsupported stream url: {0}")]
    UnsupportedStreamUrl(String),
    #[error("invalid cache filename: {0:?}")]
    InvalidFilename(String),
}

/// Kind of content, as reported by the server.
///
/// Unrecognized kinds are treated as video: they play for their intrinsic
/// duration rather than a fixed display time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    #[serde(other)]
    Video,
}

/// One piece of content within an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub original_filename: String,
    pub file_type: FileType,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    /// Download location for cached items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Display time in seconds. Only meaningful for images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl MediaItem {
    /// Human-readable name for logs and telemetry.
    pub fn display_name(&self) -> &str {
        if self.original_filename.is_empty() {
            &self.filename
        } else {
            &self.original_filename
        }
    }

    /// Validated stream location for pass-through items.
    ///
    /// Older servers put the stream location in `url` instead of `stream_url`.
    pub fn stream_location(&self) -> Result<&str, MediaError> {
        let url = self
            .stream_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|u| !u.trim().is_empty())
            .ok_or(MediaError::MissingStreamUrl)?;
        validate_stream_url(url)
    }

    /// Filename under which this item is cached.
    ///
    /// Rejects names that could escape the cache directory or collide with
    /// the cache's hidden temporary files.
    pub fn cache_name(&self) -> Result<&str, MediaError> {
        let name = self.filename.as_str();
        let invalid = name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0');
        if invalid {
            return Err(MediaError::InvalidFilename(name.to_string()));
        }
        Ok(name)
    }
}

/// Check that `url` uses one of [`STREAM_SCHEMES`].
pub fn validate_stream_url(url: &str) -> Result<&str, MediaError> {
    let scheme = url.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase());
    match scheme {
        Some(s) if STREAM_SCHEMES.contains(&s.as_str()) => Ok(url),
        _ => Err(MediaError::UnsupportedStreamUrl(url.to_string())),
    }
}

/// Resolved form of a [`MediaItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// Fully downloaded file in the cache directory.
    File(PathBuf),
    /// Stream URL handed to the player unchanged.
    Stream(String),
}

impl PlaybackSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl fmt::Display for PlaybackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stream(url) => f.write_str(url),
        }
    }
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
