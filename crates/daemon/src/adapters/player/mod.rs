// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Player adapter
//!
//! The renderer is a black box: it is launched once per manifest and only its
//! liveness and exit status are observed. Everything about terminating it
//! lives behind [`PlayerProcess::stop`].

mod process;
mod vlc;

pub use process::ProcessHandle;
pub use vlc::{DisplayEnv, VlcPlayer};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePlayer, FakeProcess, LaunchRecord};

use async_trait::async_trait;
use signage_core::Manifest;
use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from the player adapter
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("player unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// How a player process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerExit {
    pub success: bool,
    pub code: Option<i32>,
}

impl fmt::Display for PlayerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => f.write_str("killed by signal"),
        }
    }
}

/// Result of [`PlayerProcess::stop`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Process had already exited before stop was requested.
    AlreadyExited,
    /// Exited within the grace period after a terminate request.
    Terminated,
    /// Did not exit in time and was force-killed.
    Killed,
    /// Could not be signalled or reaped.
    Failed(String),
}

/// A launched renderer
#[async_trait]
pub trait PlayerProcess: Send + Sync + 'static {
    fn id(&self) -> Option<u32>;

    /// Non-blocking liveness check; `Some` once the process has exited.
    fn try_exit(&mut self) -> Result<Option<PlayerExit>, PlayerError>;

    /// Terminate gracefully, escalating to a kill after `timeout`.
    ///
    /// Never blocks longer than `timeout` plus the time to reap a killed
    /// process.
    async fn stop(&mut self, timeout: Duration) -> StopOutcome;
}

/// Launches renderers for manifests
#[async_trait]
pub trait PlayerAdapter: Clone + Send + Sync + 'static {
    type Process: PlayerProcess;

    /// Start one renderer for the manifest already written at `manifest_path`.
    async fn launch(
        &self,
        manifest_path: &Path,
        manifest: &Manifest,
    ) -> Result<Self::Process, PlayerError>;
}
