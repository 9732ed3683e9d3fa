// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content resolver
//!
//! Compares the remote assignment key against what was last applied and,
//! on a change, stops playback, fetches the full assignment and hands it to
//! the supervisor. The key includes `last_updated`, so an in-place edit of
//! the same playlist id counts as a change.

use crate::adapters::{ControlPlane, ControlPlaneError};
use crate::remote_log::RemoteLog;
use crate::supervisor::{SupervisorError, SupervisorHandle};
use signage_core::{key_changed, AssignmentKey};
use thiserror::Error;

/// Errors from one reconcile round
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("content fetch failed: {0}")]
    Fetch(#[from] ControlPlaneError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// Tracks the applied assignment key and drives changes into the supervisor
pub struct ContentResolver<C: ControlPlane> {
    plane: C,
    supervisor: SupervisorHandle,
    remote_log: RemoteLog,
    applied: Option<AssignmentKey>,
    /// False until one full fetch has succeeded.
    synced: bool,
}

impl<C: ControlPlane> ContentResolver<C> {
    pub fn new(plane: C, supervisor: SupervisorHandle, remote_log: RemoteLog) -> Self {
        Self { plane, supervisor, remote_log, applied: None, synced: false }
    }

    /// Key of the last assignment handed to the supervisor.
    pub fn applied(&self) -> Option<&AssignmentKey> {
        self.applied.as_ref()
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Fetch and apply unconditionally. Used once at startup.
    pub async fn sync_initial(&mut self) -> Result<(), ResolveError> {
        self.refresh().await
    }

    /// Apply the remote assignment if its key differs from the applied one.
    ///
    /// Returns whether a new assignment was applied. On a fetch failure
    /// playback stays stopped and the next call retries.
    pub async fn reconcile(&mut self, remote: Option<&AssignmentKey>) -> Result<bool, ResolveError> {
        if self.synced && !key_changed(self.applied.as_ref(), remote) {
            return Ok(false);
        }
        tracing::info!(
            applied = ?self.applied.as_ref().map(ToString::to_string),
            remote = ?remote.map(ToString::to_string),
            "assignment change detected"
        );
        self.refresh().await?;
        Ok(true)
    }

    async fn refresh(&mut self) -> Result<(), ResolveError> {
        self.supervisor.suspend().await?;
        let assignment = match self.plane.fetch_content().await {
            Ok(assignment) => assignment,
            Err(e) => {
                // Force a refetch on the next tick even if the key reverts.
                self.synced = false;
                if !e.is_transient() {
                    self.remote_log.error(format!("Malformed assignment from server: {}", e));
                }
                return Err(e.into());
            }
        };
        let key = assignment.key();
        tracing::info!(assignment = %assignment, "assignment fetched");
        self.supervisor.apply(assignment).await?;
        self.applied = key;
        self.synced = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
