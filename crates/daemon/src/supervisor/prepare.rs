// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving an assignment into one manifest.

use crate::cache::MediaResolver;
use signage_core::{Assignment, Manifest, ManifestEntry};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Outcome of one prepare round
#[derive(Debug)]
pub(super) struct Prepared {
    pub generation: u64,
    /// Items that resolved, in assignment order.
    pub manifest: Manifest,
    pub failures: Vec<PrepareFailure>,
}

/// An item left out of the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PrepareFailure {
    pub item_id: i64,
    pub message: String,
}

/// Resolve every item in order. Items that fail are left out and returned
/// as failures; the rest still play.
pub(super) async fn prepare<R: MediaResolver>(
    resolver: R,
    assignment: Arc<Assignment>,
    generation: u64,
) -> Prepared {
    let mut entries = Vec::with_capacity(assignment.items().len());
    let mut failures = Vec::new();
    for item in assignment.items() {
        match resolver.resolve(item).await {
            Ok(source) => {
                let secs = assignment.display_secs(item);
                entries.push(ManifestEntry::new(item.display_name(), source, secs));
            }
            Err(e) => {
                tracing::warn!(item = %item.display_name(), error = %e, "skipping item");
                failures.push(PrepareFailure {
                    item_id: item.id,
                    message: format!("Failed to prepare {}: {}", item.display_name(), e),
                });
            }
        }
    }
    Prepared { generation, manifest: Manifest::new(entries, assignment.looping()), failures }
}

/// Write `manifest` as M3U at `path`, replacing any previous one atomically.
pub async fn write_manifest(path: &Path, manifest: &Manifest) -> io::Result<()> {
    let tmp = path.with_extension("m3u.tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    let written = async {
        file.write_all(manifest.to_m3u().as_bytes()).await?;
        file.sync_all().await
    }
    .await;
    drop(file);
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
#[path = "prepare_tests.rs"]
mod tests;
