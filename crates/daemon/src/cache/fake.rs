// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CacheError, MediaResolver};
use crate::download::DownloadError;
use async_trait::async_trait;
use parking_lot::Mutex;
use signage_core::{MediaItem, PlaybackSource};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct FakeResolverState {
    failing: HashSet<String>,
    calls: HashMap<String, usize>,
    delay: Option<Duration>,
}

/// Resolver that maps filenames under a fixed directory without I/O
#[derive(Clone)]
pub struct FakeMediaResolver {
    dir: PathBuf,
    inner: Arc<Mutex<FakeResolverState>>,
}

impl FakeMediaResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), inner: Arc::default() }
    }

    /// Make downloads of `filename` fail until cleared.
    pub fn fail(&self, filename: &str) {
        self.inner.lock().failing.insert(filename.to_string());
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failing.clear();
    }

    /// Hold each resolve for `delay`, to widen race windows in tests.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.inner.lock().delay = delay;
    }

    /// Resolve attempts for `filename` (streams are keyed by URL).
    pub fn calls(&self, key: &str) -> usize {
        self.inner.lock().calls.get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl MediaResolver for FakeMediaResolver {
    async fn resolve(&self, item: &MediaItem) -> Result<PlaybackSource, CacheError> {
        let delay = self.inner.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if item.is_stream {
            let url = item.stream_location()?.to_string();
            *self.inner.lock().calls.entry(url.clone()).or_default() += 1;
            return Ok(PlaybackSource::Stream(url));
        }
        let name = item.cache_name()?.to_string();
        let mut state = self.inner.lock();
        *state.calls.entry(name.clone()).or_default() += 1;
        if state.failing.contains(&name) {
            return Err(CacheError::Download { filename: name, source: DownloadError::Status(404) });
        }
        Ok(PlaybackSource::File(self.dir.join(name)))
    }
}
