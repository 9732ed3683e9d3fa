// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command executor
//!
//! Runs the operational commands delivered by either polling channel. The
//! server hands a command out at most once, but both channels may race to
//! deliver the same intent, so reboot and update are no-ops while one is
//! already under way.

use crate::adapters::{ControlPlane, SystemAdapter};
use crate::remote_log::RemoteLog;
use crate::shutdown::{ExitReason, Shutdown};
use crate::supervisor::SupervisorHandle;
use signage_core::{CommandKind, PendingCommand};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What executing one command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Playback stopped and the host accepted the reboot request.
    Rebooting,
    /// A reboot was already in progress.
    AlreadyRebooting,
    /// The host refused; playback resumed and polling continues.
    RebootFailed(String),
    /// New executable installed; the agent is exiting.
    Updated,
    /// An update was already in progress.
    UpdateInProgress,
    /// Fetch or install failed; the existing executable is untouched.
    UpdateFailed(String),
    /// The agent is exiting for relaunch.
    Restarting,
    Ignored,
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rebooting => f.write_str("rebooting"),
            Self::AlreadyRebooting => f.write_str("already rebooting"),
            Self::RebootFailed(e) => write!(f, "reboot failed: {e}"),
            Self::Updated => f.write_str("updated"),
            Self::UpdateInProgress => f.write_str("update in progress"),
            Self::UpdateFailed(e) => write!(f, "update failed: {e}"),
            Self::Restarting => f.write_str("restarting"),
            Self::Ignored => f.write_str("ignored"),
        }
    }
}

/// Shared by the rapid poller and the heartbeat
#[derive(Clone)]
pub struct CommandExecutor<C: ControlPlane, S: SystemAdapter> {
    plane: C,
    system: S,
    supervisor: SupervisorHandle,
    shutdown: Shutdown,
    remote_log: RemoteLog,
    rebooting: Arc<AtomicBool>,
    updating: Arc<AtomicBool>,
}

impl<C: ControlPlane, S: SystemAdapter> CommandExecutor<C, S> {
    pub fn new(
        plane: C,
        system: S,
        supervisor: SupervisorHandle,
        shutdown: Shutdown,
        remote_log: RemoteLog,
    ) -> Self {
        Self {
            plane,
            system,
            supervisor,
            shutdown,
            remote_log,
            rebooting: Arc::default(),
            updating: Arc::default(),
        }
    }

    pub async fn execute(&self, command: &PendingCommand) -> CommandOutcome {
        tracing::info!(command = %command.kind, issued = ?command.timestamp, "executing command");
        let outcome = match &command.kind {
            CommandKind::Reboot => self.reboot().await,
            CommandKind::Update => self.update().await,
            CommandKind::RestartService => self.restart_service(),
            CommandKind::Unknown(kind) => {
                tracing::warn!(%kind, "ignoring unknown command");
                CommandOutcome::Ignored
            }
        };
        tracing::info!(command = %command.kind, %outcome, "command finished");
        outcome
    }

    async fn reboot(&self) -> CommandOutcome {
        if self.rebooting.swap(true, Ordering::SeqCst) {
            return CommandOutcome::AlreadyRebooting;
        }
        self.remote_log.info("Reboot command received, stopping playback");
        if let Err(e) = self.supervisor.halt().await {
            tracing::warn!(error = %e, "could not stop playback before reboot");
        }
        match self.system.reboot().await {
            Ok(()) => CommandOutcome::Rebooting,
            Err(e) => {
                tracing::error!(error = %e, "reboot failed, resuming playback");
                self.remote_log.error(format!("Reboot failed: {}", e));
                self.rebooting.store(false, Ordering::SeqCst);
                if let Err(e) = self.supervisor.resume().await {
                    tracing::warn!(error = %e, "could not resume playback");
                }
                CommandOutcome::RebootFailed(e.to_string())
            }
        }
    }

    async fn update(&self) -> CommandOutcome {
        if self.updating.swap(true, Ordering::SeqCst) {
            return CommandOutcome::UpdateInProgress;
        }
        let staged = self.system.update_staging_path();
        if let Err(detail) = self.stage_and_install(&staged).await {
            tracing::error!(error = %detail, "update failed, keeping current executable");
            self.remote_log.error(format!("Update failed: {}", detail));
            discard(&staged).await;
            self.updating.store(false, Ordering::SeqCst);
            return CommandOutcome::UpdateFailed(detail);
        }

        self.remote_log.info("Update installed, restarting agent");
        if let Err(e) = self.supervisor.halt().await {
            tracing::warn!(error = %e, "could not stop playback before exit");
        }
        self.shutdown.request(ExitReason::Updated);
        CommandOutcome::Updated
    }

    async fn stage_and_install(&self, staged: &Path) -> Result<(), String> {
        let bytes = self.plane.download_agent(staged).await.map_err(|e| e.to_string())?;
        tracing::info!(bytes, path = %staged.display(), "agent update staged");
        self.system.install_update(staged).await.map_err(|e| e.to_string())
    }

    fn restart_service(&self) -> CommandOutcome {
        self.remote_log.info("Restart command received");
        self.shutdown.request(ExitReason::RestartRequested);
        CommandOutcome::Restarting
    }
}

async fn discard(staged: &Path) {
    match tokio::fs::remove_file(staged).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %staged.display(), error = %e, "failed to remove staged update"),
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
