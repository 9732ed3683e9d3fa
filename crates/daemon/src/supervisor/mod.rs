// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playback supervisor
//!
//! One task owns the [`ClientState`] and the player process. Other tasks
//! talk to it through a [`SupervisorHandle`]; every request is handled to
//! completion before the next, so a stop always finishes before the
//! following start and at most one renderer is ever alive.
//!
//! Preparing (resolving and downloading items) runs as a cancellable future
//! inside the same task. A new request cancels it; partial downloads are
//! cleaned up by their drop guards.

mod prepare;
mod state;

pub use prepare::write_manifest;
pub use state::{ClientState, Phase, PlaybackStatus};

use crate::adapters::{PlayerAdapter, PlayerProcess, StopOutcome};
use crate::cache::MediaResolver;
use crate::remote_log::RemoteLog;
use futures_util::future::OptionFuture;
use prepare::{prepare, Prepared};
use signage_core::Assignment;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const REQUEST_CAPACITY: usize = 16;

/// Errors from [`SupervisorHandle`]
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("playback supervisor has stopped")]
    Stopped,
}

/// Supervisor timing and file locations
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Where the M3U manifest is written before each launch.
    pub manifest_path: PathBuf,
    /// Grace period between terminate and kill.
    pub stop_timeout: Duration,
    /// Player liveness check cadence.
    pub watchdog_interval: Duration,
    /// Delay before retrying a prepare that produced nothing playable or a
    /// failed launch.
    pub retry_delay: Duration,
}

impl SupervisorConfig {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            stop_timeout: Duration::from_secs(5),
            watchdog_interval: Duration::from_secs(5),
            retry_delay: Duration::from_secs(5),
        }
    }
}

enum SupervisorRequest {
    Apply { assignment: Box<Assignment>, ack: oneshot::Sender<()> },
    Suspend { ack: oneshot::Sender<()> },
    Halt { ack: oneshot::Sender<()> },
    Resume,
}

/// Cloneable front door to the supervisor task
#[derive(Clone, Debug)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<SupervisorRequest>,
    status: watch::Receiver<PlaybackStatus>,
}

impl std::fmt::Debug for SupervisorRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Apply { .. } => "Apply",
            Self::Suspend { .. } => "Suspend",
            Self::Halt { .. } => "Halt",
            Self::Resume => "Resume",
        })
    }
}

impl SupervisorHandle {
    async fn call(
        &self,
        make: impl FnOnce(oneshot::Sender<()>) -> SupervisorRequest,
    ) -> Result<(), SupervisorError> {
        let (ack, done) = oneshot::channel();
        self.tx.send(make(ack)).await.map_err(|_| SupervisorError::Stopped)?;
        done.await.map_err(|_| SupervisorError::Stopped)
    }

    /// Replace the assignment. Returns once any previous player has fully
    /// stopped; preparing the new content continues in the background.
    pub async fn apply(&self, assignment: Assignment) -> Result<(), SupervisorError> {
        self.call(|ack| SupervisorRequest::Apply { assignment: Box::new(assignment), ack }).await
    }

    /// Stop playback until the next [`apply`](Self::apply).
    pub async fn suspend(&self) -> Result<(), SupervisorError> {
        self.call(|ack| SupervisorRequest::Suspend { ack }).await
    }

    /// Stop playback and hold until [`resume`](Self::resume), even across
    /// new assignments.
    pub async fn halt(&self) -> Result<(), SupervisorError> {
        self.call(|ack| SupervisorRequest::Halt { ack }).await
    }

    pub async fn resume(&self) -> Result<(), SupervisorError> {
        self.tx.send(SupervisorRequest::Resume).await.map_err(|_| SupervisorError::Stopped)
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.clone()
    }
}

type PrepareFuture = Pin<Box<dyn Future<Output = Prepared> + Send>>;

/// Playback supervisor task state
pub struct Supervisor<P: PlayerAdapter, R: MediaResolver> {
    player: P,
    resolver: R,
    config: SupervisorConfig,
    remote_log: RemoteLog,
    state: ClientState<P::Process>,
    requests: mpsc::Receiver<SupervisorRequest>,
    status: watch::Sender<PlaybackStatus>,
}

impl<P: PlayerAdapter, R: MediaResolver> Supervisor<P, R> {
    pub fn new(
        player: P,
        resolver: R,
        config: SupervisorConfig,
        remote_log: RemoteLog,
    ) -> (Self, SupervisorHandle) {
        let (tx, requests) = mpsc::channel(REQUEST_CAPACITY);
        let (status, status_rx) = watch::channel(PlaybackStatus::default());
        let supervisor = Self {
            player,
            resolver,
            config,
            remote_log,
            state: ClientState::new(),
            requests,
            status,
        };
        (supervisor, SupervisorHandle { tx, status: status_rx })
    }

    /// Drive playback until `token` is cancelled or every handle is dropped,
    /// then stop the player.
    pub async fn run(mut self, token: CancellationToken) {
        let mut watchdog = tokio::time::interval(self.config.watchdog_interval);
        watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut preparing: Option<PrepareFuture> = None;

        loop {
            if preparing.is_none() {
                preparing = self.start_prepare();
            }
            let retry_at = self.state.retry_at();

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                request = self.requests.recv() => match request {
                    Some(request) => {
                        if self.preempts(&request) {
                            preparing = None;
                        }
                        self.handle(request).await;
                    }
                    None => break,
                },
                Some(prepared) = OptionFuture::from(preparing.as_mut()), if preparing.is_some() => {
                    preparing = None;
                    self.finish_prepare(prepared).await;
                }
                _ = watchdog.tick() => self.check_liveness(),
                _ = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    self.state.retry_due();
                }
            }
        }

        drop(preparing);
        self.stop_player().await;
        self.publish();
        tracing::info!("playback supervisor stopped");
    }

    fn publish(&self) {
        self.status.send_replace(self.state.status());
    }

    fn preempts(&self, request: &SupervisorRequest) -> bool {
        match request {
            SupervisorRequest::Apply { assignment, .. } => !self.state.is_active(assignment),
            SupervisorRequest::Suspend { .. } | SupervisorRequest::Halt { .. } => true,
            SupervisorRequest::Resume => false,
        }
    }

    async fn handle(&mut self, request: SupervisorRequest) {
        match request {
            SupervisorRequest::Apply { assignment, ack } => {
                if self.state.is_active(&assignment) {
                    tracing::debug!(assignment = %assignment, "assignment unchanged");
                } else {
                    self.stop_player().await;
                    tracing::info!(assignment = %assignment, "assignment applied");
                    self.state.assign(*assignment);
                    self.publish();
                }
                let _ = ack.send(());
            }
            SupervisorRequest::Suspend { ack } => {
                self.stop_player().await;
                self.state.suspend();
                self.publish();
                let _ = ack.send(());
            }
            SupervisorRequest::Halt { ack } => {
                self.stop_player().await;
                self.state.halt();
                self.publish();
                tracing::info!("playback halted");
                let _ = ack.send(());
            }
            SupervisorRequest::Resume => {
                if self.state.is_halted() {
                    self.state.resume();
                    self.publish();
                    tracing::info!("playback resumed");
                }
            }
        }
    }

    fn start_prepare(&mut self) -> Option<PrepareFuture> {
        let (generation, assignment) = self.state.begin_preparing()?;
        tracing::info!(assignment = %assignment, "preparing");
        self.publish();
        Some(Box::pin(prepare(self.resolver.clone(), assignment, generation)))
    }

    async fn finish_prepare(&mut self, prepared: Prepared) {
        if prepared.generation != self.state.generation() {
            return;
        }
        for failure in prepared.failures {
            if self.state.first_failure(failure.item_id) {
                self.remote_log.error(failure.message);
            }
        }
        let manifest = prepared.manifest;
        if manifest.is_empty() {
            let assignment = Arc::clone(self.state.assignment());
            tracing::warn!(%assignment, retry_in = ?self.config.retry_delay, "no playable items");
            if self.state.first_empty_report() {
                self.remote_log.error(format!("No playable items in {}", assignment));
            }
            self.retry_later();
            return;
        }

        let path = self.config.manifest_path.clone();
        if let Err(e) = write_manifest(&path, &manifest).await {
            tracing::error!(path = %path.display(), error = %e, "failed to write manifest");
            self.remote_log.error(format!("Failed to write playlist manifest: {}", e));
            self.retry_later();
            return;
        }

        match self.player.launch(&path, &manifest).await {
            Ok(process) => {
                let pid = process.id();
                match self.state.begin_playing(prepared.generation, process) {
                    Ok(()) => {
                        tracing::info!(?pid, entries = manifest.len(), "playing");
                        self.publish();
                    }
                    Err(mut orphan) => {
                        tracing::warn!(?pid, "launch raced a state change, stopping");
                        orphan.stop(self.config.stop_timeout).await;
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, retry_in = ?self.config.retry_delay, "player launch failed");
                self.remote_log.error(format!("Player launch failed: {}", e));
                self.retry_later();
            }
        }
    }

    fn retry_later(&mut self) {
        self.state.schedule_retry(Instant::now() + self.config.retry_delay);
        self.publish();
    }

    fn check_liveness(&mut self) {
        let Some(process) = self.state.player_mut() else {
            return;
        };
        let pid = process.id();
        let exit = match process.try_exit() {
            Ok(Some(exit)) => exit,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(?pid, error = %e, "player liveness check failed");
                return;
            }
        };

        let finished = exit.success && !self.state.assignment().looping();
        if finished {
            tracing::info!(?pid, "playback finished");
        } else {
            tracing::warn!(?pid, %exit, "player exited unexpectedly, restarting");
            self.remote_log.warning(format!("Player exited unexpectedly ({}), restarting", exit));
        }
        self.state.player_exited(finished);
        self.publish();
    }

    async fn stop_player(&mut self) {
        if let Some(mut process) = self.state.begin_stopping() {
            self.publish();
            let pid = process.id();
            match process.stop(self.config.stop_timeout).await {
                StopOutcome::AlreadyExited | StopOutcome::Terminated => {
                    tracing::info!(?pid, "player stopped");
                }
                StopOutcome::Killed => {
                    tracing::warn!(?pid, "player killed after stop timeout");
                }
                StopOutcome::Failed(e) => {
                    tracing::error!(?pid, error = %e, "failed to stop player");
                    self.remote_log.error(format!("Failed to stop player: {}", e));
                }
            }
        }
        self.state.finish_stopping();
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
