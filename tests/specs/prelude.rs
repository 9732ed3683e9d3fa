// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: one agent on fakes with short timings.

pub use signage_core::test_support::{image, playlist, three_item_playlist};
pub use signage_core::{Assignment, CommandKind, LogKind};
pub use signage_daemon::adapters::{FakeControlPlane, FakePlayer, FakeSystem, SystemCall};
pub use signage_daemon::{ExitReason, Phase, PlaybackStatus, Shutdown};
pub use std::time::Duration;

use signage_core::FakeClock;
use signage_daemon::cache::FakeMediaResolver;
use signage_daemon::lifecycle::{launch, Adapters, Config, RunningAgent};
use tempfile::TempDir;

/// Rapid poll and watchdog cadence used by every spec
pub const TICK: Duration = Duration::from_millis(25);

pub struct Device {
    pub plane: FakeControlPlane,
    pub player: FakePlayer,
    pub system: FakeSystem,
    pub media: FakeMediaResolver,
    pub agent: Option<RunningAgent>,
    dir: TempDir,
}

impl Device {
    /// A device whose server already holds `assignment`.
    pub fn new(assignment: Assignment) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("state")).unwrap();
        let plane = FakeControlPlane::new();
        plane.set_assignment(assignment);
        Self {
            plane,
            player: FakePlayer::new(),
            system: FakeSystem::new(dir.path().join("state")),
            media: FakeMediaResolver::new(dir.path().join("media")),
            agent: None,
            dir,
        }
    }

    pub fn config(&self) -> Config {
        let mut config =
            Config::with_dirs(self.dir.path().join("state"), self.dir.path().join("media"));
        config.rapid_interval = TICK;
        config.heartbeat_interval = Duration::from_millis(100);
        config.watchdog_interval = TICK;
        config.retry_delay = Duration::from_millis(50);
        config.stop_timeout = Duration::from_millis(100);
        config
    }

    /// Boot the agent and wait for the initial sync to finish.
    pub async fn boot(mut self) -> Self {
        let adapters = Adapters {
            plane: self.plane.clone(),
            player: self.player.clone(),
            system: self.system.clone(),
            resolver: self.media.clone(),
            clock: FakeClock::new(),
        };
        let config = self.config();
        self.agent = Some(launch(adapters, &config, Shutdown::new()).await);
        self
    }

    fn agent(&self) -> &RunningAgent {
        self.agent.as_ref().unwrap()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.agent().supervisor().status()
    }

    pub async fn wait_for(&self, pred: impl FnMut(&PlaybackStatus) -> bool) -> PlaybackStatus {
        let mut rx = self.agent().supervisor().subscribe();
        let status = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for playback status")
            .unwrap()
            .clone();
        status
    }

    pub async fn playing(&self) -> PlaybackStatus {
        self.wait_for(|s| s.phase == Phase::Playing).await
    }

    /// Stop the agent and return why it exited.
    pub async fn stop(mut self) -> ExitReason {
        let agent = self.agent.take().unwrap();
        agent.shutdown().request(ExitReason::Signal);
        tokio::time::timeout(Duration::from_secs(5), agent.wait()).await.unwrap()
    }

    /// Wait for the agent to exit on its own.
    pub async fn exited(mut self) -> ExitReason {
        let agent = self.agent.take().unwrap();
        tokio::time::timeout(Duration::from_secs(5), agent.wait()).await.unwrap()
    }

    pub fn error_logs(&self) -> Vec<String> {
        self.plane
            .logs()
            .into_iter()
            .filter(|l| l.kind == LogKind::Error)
            .map(|l| l.message)
            .collect()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if let Some(agent) = &self.agent {
            agent.shutdown().request(ExitReason::Signal);
        }
    }
}

pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
