// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic tasks: rapid status poll, heartbeat checkin, cache sweep.
//!
//! Each loop runs on a fixed interval and exits when the token is
//! cancelled. A failed cycle is logged and skipped; there is no backoff
//! beyond the interval itself.

use crate::adapters::{ControlPlane, ControlPlaneError, SystemAdapter};
use crate::cache::sweep;
use crate::env::CLIENT_VERSION;
use crate::executor::CommandExecutor;
use crate::resolver::{ContentResolver, ResolveError};
use crate::supervisor::SupervisorHandle;
use signage_core::{CheckinReport, Clock};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Cache files older than this and unreferenced are deleted.
pub const CACHE_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache sweep cadence.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn log_cycle_error(task: &'static str, e: &ControlPlaneError) {
    if e.is_transient() {
        tracing::warn!(task, error = %e, "control plane unreachable, skipping cycle");
    } else {
        tracing::error!(task, error = %e, "malformed control plane response, skipping cycle");
    }
}

/// Rapid status poll
///
/// A pending command goes to the executor and the assignment check is
/// skipped for that cycle; otherwise the resolver compares keys.
pub async fn rapid_poll<C: ControlPlane, S: SystemAdapter>(
    plane: C,
    mut resolver: ContentResolver<C>,
    executor: CommandExecutor<C, S>,
    period: Duration,
    token: CancellationToken,
) {
    let mut interval = ticker(period);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }
        let status = match plane.playlist_status().await {
            Ok(status) => status,
            Err(e) => {
                log_cycle_error("rapid_poll", &e);
                continue;
            }
        };
        if let Some(command) = status.command {
            executor.execute(&command).await;
            continue;
        }
        match resolver.reconcile(status.remote.as_ref()).await {
            Ok(_) => {}
            Err(ResolveError::Fetch(e)) => log_cycle_error("rapid_poll", &e),
            Err(e @ ResolveError::Supervisor(_)) => {
                tracing::debug!(error = %e, "supervisor gone, stopping rapid poll");
                break;
            }
        }
    }
    tracing::debug!("rapid poll stopped");
}

/// Heartbeat reporter
///
/// Posts telemetry once per period. The checkin response may carry a
/// command, which is executed like one from the rapid poll.
pub struct Heartbeat<C: ControlPlane, S: SystemAdapter, K: Clock> {
    plane: C,
    system: S,
    clock: K,
    supervisor: SupervisorHandle,
    executor: CommandExecutor<C, S>,
    teamviewer_id: OnceCell<Option<String>>,
}

impl<C: ControlPlane, S: SystemAdapter, K: Clock> Heartbeat<C, S, K> {
    pub fn new(
        plane: C,
        system: S,
        clock: K,
        supervisor: SupervisorHandle,
        executor: CommandExecutor<C, S>,
    ) -> Self {
        Self { plane, system, clock, supervisor, executor, teamviewer_id: OnceCell::new() }
    }

    /// Telemetry for the current moment.
    pub async fn report(&self) -> CheckinReport {
        let teamviewer_id = self
            .teamviewer_id
            .get_or_init(|| async {
                let id = self.system.teamviewer_id().await;
                tracing::info!(teamviewer_id = ?id, "remote support id detected");
                id
            })
            .await
            .clone();
        CheckinReport {
            current_media: self.supervisor.status().current_media,
            timestamp: self.clock.timestamp(),
            client_version: CLIENT_VERSION.to_string(),
            teamviewer_id,
        }
    }

    /// One checkin round.
    pub async fn beat(&self) -> Result<(), ControlPlaneError> {
        let report = self.report().await;
        let ack = self.plane.checkin(&report).await?;
        tracing::debug!(
            current_media = ?report.current_media,
            assignment_id = ?ack.assignment_id,
            "checkin sent"
        );
        if let Some(command) = ack.command {
            self.executor.execute(&command).await;
        }
        Ok(())
    }

    pub async fn run(self, period: Duration, token: CancellationToken) {
        let mut interval = ticker(period);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }
            if let Err(e) = self.beat().await {
                log_cycle_error("heartbeat", &e);
            }
        }
        tracing::debug!("heartbeat stopped");
    }
}

/// Cache sweep settings
#[derive(Debug, Clone)]
pub struct SweepSchedule {
    pub dir: PathBuf,
    pub period: Duration,
    pub retention: Duration,
}

impl SweepSchedule {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), period: SWEEP_INTERVAL, retention: CACHE_RETENTION }
    }
}

/// Evict unreferenced cache files on a fixed cadence.
///
/// The first sweep runs one full period after start so a fresh boot does
/// not race the initial downloads.
pub async fn sweep_cache<K: Clock>(
    schedule: SweepSchedule,
    supervisor: SupervisorHandle,
    clock: K,
    token: CancellationToken,
) {
    let start = tokio::time::Instant::now() + schedule.period;
    let mut interval = tokio::time::interval_at(start, schedule.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }
        let referenced = supervisor.status().referenced_files;
        let dir = schedule.dir.clone();
        let now = clock.system_time();
        let retention = schedule.retention;
        let result =
            tokio::task::spawn_blocking(move || sweep(&dir, &referenced, now, retention)).await;
        match result {
            Ok(Ok(report)) => tracing::info!(
                removed = report.removed.len(),
                kept_referenced = report.kept_referenced,
                kept_recent = report.kept_recent,
                failed = report.failed,
                "cache sweep finished"
            ),
            Ok(Err(e)) => {
                tracing::warn!(dir = %schedule.dir.display(), error = %e, "cache sweep failed")
            }
            Err(e) => tracing::error!(error = %e, "cache sweep task panicked"),
        }
    }
    tracing::debug!("cache sweep stopped");
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
