// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache eviction.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// What one sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<String>,
    pub kept_referenced: usize,
    /// Unreferenced but younger than the retention window.
    pub kept_recent: usize,
    pub failed: usize,
}

/// Delete files in `dir` that are not in `referenced` and were last modified
/// at least `retention` before `now`.
///
/// Referenced files are never touched regardless of age. Leftover partial
/// downloads are ordinary unreferenced files here.
pub fn sweep(
    dir: &Path,
    referenced: &BTreeSet<String>,
    now: SystemTime,
    retention: Duration,
) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = match entry.metadata() {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "cannot stat cache entry");
                report.failed += 1;
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if referenced.contains(&name) {
            report.kept_referenced += 1;
            continue;
        }

        let modified = meta.modified().unwrap_or(now);
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < retention {
            report.kept_recent += 1;
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::info!(item = %name, age_secs = age.as_secs(), "evicted from cache");
                report.removed.push(name);
            }
            Err(e) => {
                tracing::warn!(item = %name, error = %e, "failed to evict");
                report.failed += 1;
            }
        }
    }
    report.removed.sort();
    Ok(report)
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
