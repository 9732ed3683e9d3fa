// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process handle with terminate-then-kill shutdown.

use super::{PlayerError, PlayerExit, PlayerProcess, StopOutcome};
use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};

/// A spawned renderer process
///
/// The child is killed if the handle is dropped without being stopped.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    program: String,
}

impl ProcessHandle {
    /// Spawn `cmd` detached from our stdio.
    pub fn spawn(mut cmd: Command, program: &str) -> Result<Self, PlayerError> {
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).kill_on_drop(true);
        let child = cmd
            .spawn()
            .map_err(|source| PlayerError::Launch { program: program.to_string(), source })?;
        Ok(Self { child, program: program.to_string() })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn terminate(&self) -> Result<(), String> {
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid).map_err(|e| e.to_string())?;
        kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(|e| e.to_string())
    }
}

fn to_exit(status: ExitStatus) -> PlayerExit {
    PlayerExit { success: status.success(), code: status.code() }
}

#[async_trait]
impl PlayerProcess for ProcessHandle {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_exit(&mut self) -> Result<Option<PlayerExit>, PlayerError> {
        Ok(self.child.try_wait()?.map(to_exit))
    }

    async fn stop(&mut self, timeout: Duration) -> StopOutcome {
        match self.child.try_wait() {
            Ok(Some(_)) => return StopOutcome::AlreadyExited,
            Ok(None) => {}
            Err(e) => return StopOutcome::Failed(e.to_string()),
        }

        let pid = self.child.id();
        if let Err(e) = self.terminate() {
            tracing::warn!(?pid, error = %e, "terminate signal failed, killing");
        } else {
            match tokio::time::timeout(timeout, self.child.wait()).await {
                Ok(Ok(_)) => return StopOutcome::Terminated,
                Ok(Err(e)) => return StopOutcome::Failed(e.to_string()),
                Err(_) => {
                    tracing::warn!(?pid, ?timeout, "player ignored terminate, killing");
                }
            }
        }

        match self.child.kill().await {
            Ok(()) => StopOutcome::Killed,
            Err(e) => StopOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
