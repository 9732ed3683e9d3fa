// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VLC launched headless and fullscreen on one M3U manifest.

use super::{PlayerAdapter, PlayerError, PlayerProcess, ProcessHandle};
use crate::env;
use async_trait::async_trait;
use signage_core::{Manifest, DEFAULT_IMAGE_SECS};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

const BASE_FLAGS: &[&str] = &[
    "--intf",
    "dummy",
    "--fullscreen",
    "--no-osd",
    "--no-video-title-show",
    "--no-qt-privacy-ask",
    "--quiet",
    "--no-interact",
    "--playlist-autostart",
    "--no-random",
];

/// Graphical session the player renders into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEnv {
    Wayland(String),
    X11 { display: String, xauthority: Option<PathBuf> },
}

impl DisplayEnv {
    /// Read the session from the agent's own environment.
    pub fn detect() -> Self {
        let mut candidates = Vec::new();
        candidates.extend(env::xauthority());
        candidates.extend(dirs::home_dir().map(|home| home.join(".Xauthority")));
        Self::resolve(env::wayland_display(), env::x_display(), &candidates)
    }

    /// Wayland wins when present; otherwise X11 on `:0` with the first
    /// existing Xauthority candidate.
    pub fn resolve(
        wayland: Option<String>,
        display: Option<String>,
        xauthority_candidates: &[PathBuf],
    ) -> Self {
        if let Some(wayland) = wayland {
            return Self::Wayland(wayland);
        }
        Self::X11 {
            display: display.unwrap_or_else(|| ":0".to_string()),
            xauthority: xauthority_candidates.iter().find(|p| p.exists()).cloned(),
        }
    }

    fn apply(&self, cmd: &mut Command) {
        match self {
            Self::Wayland(socket) => {
                cmd.env("WAYLAND_DISPLAY", socket).env("QT_QPA_PLATFORM", "wayland");
            }
            Self::X11 { display, xauthority } => {
                cmd.env("DISPLAY", display);
                if let Some(path) = xauthority {
                    cmd.env("XAUTHORITY", path);
                }
            }
        }
    }
}

/// VLC player adapter
#[derive(Debug, Clone)]
pub struct VlcPlayer {
    program: String,
    screen_index: u32,
    display: DisplayEnv,
}

impl VlcPlayer {
    pub fn new(program: impl Into<String>, screen_index: u32, display: DisplayEnv) -> Self {
        Self { program: program.into(), screen_index, display }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one manifest.
    pub fn args(&self, manifest_path: &Path, manifest: &Manifest) -> Vec<String> {
        let mut args: Vec<String> = BASE_FLAGS.iter().map(|s| s.to_string()).collect();
        args.push(if manifest.looping() { "--loop" } else { "--play-and-exit" }.to_string());

        let image_secs = manifest
            .entries()
            .iter()
            .find_map(|e| e.display_secs)
            .unwrap_or(DEFAULT_IMAGE_SECS);
        args.push("--image-duration".to_string());
        args.push(image_secs.to_string());

        args.push("--qt-fullscreen-screennumber".to_string());
        args.push(self.screen_index.to_string());

        args.push(manifest_path.display().to_string());
        args
    }

    /// Run `<player> --version`; returns the first line of output.
    pub async fn version(&self) -> Result<String, PlayerError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--version").stdin(Stdio::null()).kill_on_drop(true);
        let output = tokio::time::timeout(VERSION_TIMEOUT, cmd.output())
            .await
            .map_err(|_| PlayerError::Unavailable(format!("{} --version timed out", self.program)))?
            .map_err(|e| PlayerError::Unavailable(format!("{}: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(PlayerError::Unavailable(format!(
                "{} --version exited with {}",
                self.program, output.status
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl PlayerAdapter for VlcPlayer {
    type Process = ProcessHandle;

    async fn launch(
        &self,
        manifest_path: &Path,
        manifest: &Manifest,
    ) -> Result<ProcessHandle, PlayerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(manifest_path, manifest));
        self.display.apply(&mut cmd);
        let handle = ProcessHandle::spawn(cmd, &self.program)?;
        tracing::info!(
            program = %self.program,
            pid = ?handle.id(),
            entries = manifest.len(),
            looping = manifest.looping(),
            "player launched"
        );
        Ok(handle)
    }
}

#[cfg(test)]
#[path = "vlc_tests.rs"]
mod tests;
