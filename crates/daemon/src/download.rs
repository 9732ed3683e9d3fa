// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streamed HTTP downloads with atomic publish.
//!
//! Bytes go to a hidden `.part` file next to the destination and are renamed
//! into place only after the body has been fully written and synced. A crash
//! or cancellation mid-download never leaves a partial file under the final
//! name.

use futures_util::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Suffix of in-flight download files
pub const PARTIAL_SUFFIX: &str = ".part";

/// Errors from a single download
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("no data received for {0:?}")]
    Stalled(Duration),
    #[error("body truncated: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

/// Temp file removed on drop unless published.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    /// Reserve a unique hidden temp path beside `dest`.
    pub fn beside(dest: &Path) -> Self {
        let name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let tmp = format!(".{}.{}{}", name, uuid::Uuid::new_v4().simple(), PARTIAL_SUFFIX);
        let path = match dest.parent() {
            Some(dir) => dir.join(tmp),
            None => PathBuf::from(tmp),
        };
        Self { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename into place; the guard no longer owns the file afterwards.
    pub async fn publish(mut self, dest: &Path) -> io::Result<()> {
        tokio::fs::rename(&self.path, dest).await?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Stream `url` into `dest`, publishing atomically. Returns bytes written.
///
/// `idle` bounds the wait for the response head and for each body chunk, so
/// a slow but progressing transfer of a large video is not cut off.
pub async fn fetch_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    idle: Duration,
) -> Result<u64, DownloadError> {
    let response = tokio::time::timeout(idle, client.get(url).send())
        .await
        .map_err(|_| DownloadError::Stalled(idle))??;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status.as_u16()));
    }
    let expected = response.content_length();

    let partial = PartialFile::beside(dest);
    let mut file = tokio::fs::File::create(partial.path()).await?;
    let mut body = response.bytes_stream();
    let mut received: u64 = 0;
    loop {
        match tokio::time::timeout(idle, body.next()).await {
            Err(_) => return Err(DownloadError::Stalled(idle)),
            Ok(None) => break,
            Ok(Some(chunk)) => {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                received += chunk.len() as u64;
            }
        }
    }
    if let Some(expected) = expected {
        if expected != received {
            return Err(DownloadError::Truncated { expected, received });
        }
    }
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    partial.publish(dest).await?;
    Ok(received)
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
