// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Media cache
//!
//! Turns a [`MediaItem`] into something the player can open: a fully
//! downloaded file in the cache directory, or a validated stream URL passed
//! through untouched. Files are published atomically by [`crate::download`],
//! so a file under its final name is always complete.

mod sweep;

pub use sweep::{sweep, SweepReport};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMediaResolver;

use crate::download::{self, DownloadError};
use async_trait::async_trait;
use signage_core::{MediaError, MediaItem, PlaybackSource};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// No bytes for this long aborts a media download.
pub const DOWNLOAD_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors resolving one item
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("download of {filename} failed: {source}")]
    Download {
        filename: String,
        #[source]
        source: DownloadError,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Resolves items to playback sources
#[async_trait]
pub trait MediaResolver: Clone + Send + Sync + 'static {
    async fn resolve(&self, item: &MediaItem) -> Result<PlaybackSource, CacheError>;
}

/// On-disk cache backed by HTTP downloads
#[derive(Debug, Clone)]
pub struct MediaCache {
    client: reqwest::Client,
    dir: PathBuf,
    /// Server base, for items whose url is relative or missing.
    base_url: String,
    idle_timeout: Duration,
}

impl MediaCache {
    pub fn new(client: reqwest::Client, dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            client,
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            idle_timeout: DOWNLOAD_IDLE_TIMEOUT,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn download_url(&self, item: &MediaItem, name: &str) -> String {
        match item.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) if url.contains("://") => url.to_string(),
            Some(path) if path.starts_with('/') => format!("{}{}", self.base_url, path),
            Some(path) => format!("{}/{}", self.base_url, path),
            None => format!("{}/uploads/{}", self.base_url, name),
        }
    }
}

/// Bump mtime so the sweep measures age from last use.
async fn touch(path: &Path) -> io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        std::fs::OpenOptions::new().append(true).open(&path)?.set_modified(SystemTime::now())
    })
    .await
    .map_err(io::Error::other)?
}

#[async_trait]
impl MediaResolver for MediaCache {
    async fn resolve(&self, item: &MediaItem) -> Result<PlaybackSource, CacheError> {
        if item.is_stream {
            return Ok(PlaybackSource::Stream(item.stream_location()?.to_string()));
        }

        let name = item.cache_name()?;
        let path = self.dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                if let Err(e) = touch(&path).await {
                    tracing::debug!(item = %name, error = %e, "failed to refresh cache mtime");
                }
                tracing::debug!(item = %name, "cache hit");
                return Ok(PlaybackSource::File(path));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let url = self.download_url(item, name);
        tracing::info!(item = %name, %url, "downloading");
        let bytes = download::fetch_to(&self.client, &url, &path, self.idle_timeout)
            .await
            .map_err(|source| CacheError::Download { filename: name.to_string(), source })?;
        tracing::info!(item = %name, bytes, "cached");
        Ok(PlaybackSource::File(path))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
