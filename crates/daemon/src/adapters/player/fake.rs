// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PlayerAdapter, PlayerError, PlayerExit, PlayerProcess, StopOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use signage_core::Manifest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Recorded launch
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub pid: u32,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

type ExitSlot = Arc<Mutex<Option<PlayerExit>>>;

struct FakePlayerState {
    launches: Vec<LaunchRecord>,
    /// Exit slots of processes not yet exited, in launch order.
    live: Vec<(u32, ExitSlot)>,
    max_live: usize,
    fail_next: usize,
    stops: usize,
    next_pid: u32,
}

impl Default for FakePlayerState {
    fn default() -> Self {
        Self {
            launches: Vec::new(),
            live: Vec::new(),
            max_live: 0,
            fail_next: 0,
            stops: 0,
            next_pid: 1000,
        }
    }
}

impl FakePlayerState {
    fn exit(&mut self, pid: u32, exit: PlayerExit) -> bool {
        let Some(at) = self.live.iter().position(|(p, _)| *p == pid) else {
            return false;
        };
        let (_, slot) = self.live.remove(at);
        *slot.lock() = Some(exit);
        true
    }
}

/// Fake player for testing
///
/// Tracks how many processes are alive at once so tests can assert the
/// single-renderer invariant.
#[derive(Clone, Default)]
pub struct FakePlayer {
    inner: Arc<Mutex<FakePlayerState>>,
}

impl FakePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launch_count(&self) -> usize {
        self.inner.lock().launches.len()
    }

    pub fn last_launch(&self) -> Option<LaunchRecord> {
        self.inner.lock().launches.last().cloned()
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    /// Highest number of simultaneously live processes ever observed.
    pub fn max_live(&self) -> usize {
        self.inner.lock().max_live
    }

    pub fn stop_count(&self) -> usize {
        self.inner.lock().stops
    }

    /// Fail the next `n` launches.
    pub fn fail_next_launches(&self, n: usize) {
        self.inner.lock().fail_next = n;
    }

    /// Make the newest live process exit with a failure. Returns whether one
    /// was running.
    pub fn crash_current(&self) -> bool {
        self.exit_current(PlayerExit { success: false, code: Some(1) })
    }

    /// Make the newest live process exit cleanly, as at the end of a
    /// non-looping manifest.
    pub fn finish_current(&self) -> bool {
        self.exit_current(PlayerExit { success: true, code: Some(0) })
    }

    fn exit_current(&self, exit: PlayerExit) -> bool {
        let mut state = self.inner.lock();
        let Some(pid) = state.live.last().map(|(pid, _)| *pid) else {
            return false;
        };
        state.exit(pid, exit)
    }
}

#[async_trait]
impl PlayerAdapter for FakePlayer {
    type Process = FakeProcess;

    async fn launch(
        &self,
        manifest_path: &Path,
        manifest: &Manifest,
    ) -> Result<FakeProcess, PlayerError> {
        let mut state = self.inner.lock();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(PlayerError::Launch {
                program: "fake".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "injected failure"),
            });
        }
        let pid = state.next_pid;
        state.next_pid += 1;
        let slot: ExitSlot = Arc::default();
        state.live.push((pid, Arc::clone(&slot)));
        state.max_live = state.max_live.max(state.live.len());
        state.launches.push(LaunchRecord {
            pid,
            manifest_path: manifest_path.to_path_buf(),
            manifest: manifest.clone(),
        });
        Ok(FakeProcess { pid, exit: slot, player: Arc::clone(&self.inner) })
    }
}

/// Process handle returned by [`FakePlayer`]
pub struct FakeProcess {
    pid: u32,
    exit: ExitSlot,
    player: Arc<Mutex<FakePlayerState>>,
}

#[async_trait]
impl PlayerProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_exit(&mut self) -> Result<Option<PlayerExit>, PlayerError> {
        Ok(*self.exit.lock())
    }

    async fn stop(&mut self, _timeout: Duration) -> StopOutcome {
        let mut state = self.player.lock();
        state.stops += 1;
        if state.exit(self.pid, PlayerExit { success: false, code: None }) {
            StopOutcome::Terminated
        } else {
            StopOutcome::AlreadyExited
        }
    }
}

impl Drop for FakeProcess {
    fn drop(&mut self) {
        self.player.lock().exit(self.pid, PlayerExit { success: false, code: None });
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
