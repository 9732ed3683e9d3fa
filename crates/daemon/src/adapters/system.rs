// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host operating-system facilities: reboot, self-replacement, remote-support id.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

const TEAMVIEWER_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from host operations
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("reboot command is empty")]
    NoRebootCommand,
    #[error("`{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Adapter for host-level side effects
#[async_trait]
pub trait SystemAdapter: Clone + Send + Sync + 'static {
    /// Ask the OS to reboot. Returns once the request was accepted.
    async fn reboot(&self) -> Result<(), SystemError>;

    /// Where a staged update should be written so the final rename stays on
    /// one filesystem.
    fn update_staging_path(&self) -> PathBuf;

    /// Make `staged` executable and atomically move it over the running
    /// executable.
    async fn install_update(&self, staged: &Path) -> Result<(), SystemError>;

    /// Remote-support identifier, if the tool is installed.
    async fn teamviewer_id(&self) -> Option<String>;
}

/// The real host
#[derive(Debug, Clone)]
pub struct HostSystem {
    reboot_command: Vec<String>,
    exe_path: PathBuf,
}

impl HostSystem {
    pub fn new(reboot_command: Vec<String>, exe_path: PathBuf) -> Self {
        Self { reboot_command, exe_path }
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }
}

#[async_trait]
impl SystemAdapter for HostSystem {
    async fn reboot(&self) -> Result<(), SystemError> {
        let Some((program, args)) = self.reboot_command.split_first() else {
            return Err(SystemError::NoRebootCommand);
        };
        let command = self.reboot_command.join(" ");
        tracing::warn!(%command, "rebooting host");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SystemError::CommandFailed {
                command: command.clone(),
                detail: e.to_string(),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() { output.status.to_string() } else { stderr };
            return Err(SystemError::CommandFailed { command, detail });
        }
        Ok(())
    }

    fn update_staging_path(&self) -> PathBuf {
        let name = self
            .exe_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "signaged".to_string());
        self.exe_path.with_file_name(format!(".{}.update", name))
    }

    async fn install_update(&self, staged: &Path) -> Result<(), SystemError> {
        use std::os::unix::fs::PermissionsExt;

        tokio::fs::set_permissions(staged, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|source| SystemError::Io { path: staged.to_path_buf(), source })?;
        tokio::fs::rename(staged, &self.exe_path)
            .await
            .map_err(|source| SystemError::Io { path: self.exe_path.clone(), source })?;
        tracing::info!(exe = %self.exe_path.display(), "agent executable replaced");
        Ok(())
    }

    async fn teamviewer_id(&self) -> Option<String> {
        let mut cmd = Command::new("teamviewer");
        cmd.arg("--info").stdin(Stdio::null()).stderr(Stdio::null()).kill_on_drop(true);
        let output = match tokio::time::timeout(TEAMVIEWER_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(output)) => {
                tracing::debug!(status = %output.status, "teamviewer --info failed");
                return None;
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "teamviewer not available");
                return None;
            }
            Err(_) => {
                tracing::debug!("teamviewer --info timed out");
                return None;
            }
        };
        parse_teamviewer_id(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the digits after `TeamViewer ID:` from `teamviewer --info` output.
pub fn parse_teamviewer_id(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once("TeamViewer ID:")?;
        let id: String = rest.trim().chars().take_while(char::is_ascii_digit).collect();
        (!id.is_empty()).then_some(id)
    })
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{SystemAdapter, SystemError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Recorded host call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SystemCall {
        Reboot,
        InstallUpdate { bytes: Vec<u8> },
        TeamviewerId,
    }

    #[derive(Default)]
    struct FakeSystemState {
        calls: Vec<SystemCall>,
        fail_reboot: bool,
        fail_install: bool,
        teamviewer_id: Option<String>,
    }

    /// Fake host for testing
    ///
    /// Staged updates are written under `dir`; the "installed" bytes are
    /// recorded rather than replacing anything.
    #[derive(Clone)]
    pub struct FakeSystem {
        dir: PathBuf,
        inner: Arc<Mutex<FakeSystemState>>,
    }

    impl FakeSystem {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into(), inner: Arc::default() }
        }

        pub fn calls(&self) -> Vec<SystemCall> {
            self.inner.lock().calls.clone()
        }

        pub fn reboot_count(&self) -> usize {
            self.calls().iter().filter(|c| **c == SystemCall::Reboot).count()
        }

        pub fn set_fail_reboot(&self, fail: bool) {
            self.inner.lock().fail_reboot = fail;
        }

        pub fn set_fail_install(&self, fail: bool) {
            self.inner.lock().fail_install = fail;
        }

        pub fn set_teamviewer_id(&self, id: Option<&str>) {
            self.inner.lock().teamviewer_id = id.map(str::to_string);
        }
    }

    #[async_trait]
    impl SystemAdapter for FakeSystem {
        async fn reboot(&self) -> Result<(), SystemError> {
            let mut state = self.inner.lock();
            state.calls.push(SystemCall::Reboot);
            if state.fail_reboot {
                return Err(SystemError::CommandFailed {
                    command: "reboot".to_string(),
                    detail: "not permitted".to_string(),
                });
            }
            Ok(())
        }

        fn update_staging_path(&self) -> PathBuf {
            self.dir.join(".signaged.update")
        }

        async fn install_update(&self, staged: &Path) -> Result<(), SystemError> {
            if self.inner.lock().fail_install {
                return Err(SystemError::Io {
                    path: staged.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            let bytes = tokio::fs::read(staged)
                .await
                .map_err(|source| SystemError::Io { path: staged.to_path_buf(), source })?;
            let _ = tokio::fs::remove_file(staged).await;
            self.inner.lock().calls.push(SystemCall::InstallUpdate { bytes });
            Ok(())
        }

        async fn teamviewer_id(&self) -> Option<String> {
            let mut state = self.inner.lock();
            state.calls.push(SystemCall::TeamviewerId);
            state.teamviewer_id.clone()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSystem, SystemCall};

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
