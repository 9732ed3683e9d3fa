// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle: configuration, startup, single-instance lock, shutdown.

mod startup;

pub use startup::{acquire_lock, launch, startup, Adapters, Agent, RunningAgent};

use crate::adapters::ControlPlaneError;
use crate::env;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
const DEFAULT_DEVICE_ID: &str = "device-001";
const DEFAULT_PLAYER: &str = "vlc";

/// Agent configuration, resolved once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub device_id: String,
    /// Heartbeat (checkin) period
    pub heartbeat_interval: Duration,
    /// Rapid status poll period
    pub rapid_interval: Duration,
    /// Downloaded media; swept periodically
    pub media_dir: PathBuf,
    /// Root state directory (e.g. ~/.local/state/signage)
    pub state_dir: PathBuf,
    pub screen_index: u32,
    /// Player program
    pub player: String,
    pub reboot_command: Vec<String>,
    /// Where the `update` command downloads the agent from
    pub update_url: String,
    pub stop_timeout: Duration,
    pub watchdog_interval: Duration,
    pub retry_delay: Duration,
    pub sweep_interval: Duration,
    pub cache_retention: Duration,
}

/// Optional TOML file; every key may be omitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server_url: Option<String>,
    pub device_id: Option<String>,
    /// Seconds
    pub check_interval: Option<u64>,
    /// Seconds
    pub rapid_check_interval: Option<u64>,
    pub media_dir: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub screen_index: Option<u32>,
    pub player: Option<String>,
    pub reboot_command: Option<Vec<String>>,
    pub update_url: Option<String>,
    pub stop_timeout_ms: Option<u64>,
    pub watchdog_ms: Option<u64>,
    pub retry_delay_ms: Option<u64>,
}

impl FileConfig {
    /// Parse `path`. A missing file is an empty config.
    pub fn read(path: &Path) -> Result<Self, LifecycleError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(LifecycleError::Io(e)),
        };
        toml::from_str(&text)
            .map_err(|source| LifecycleError::Config { path: path.to_path_buf(), source })
    }
}

fn positive_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|n| *n > 0).map(Duration::from_secs)
}

fn positive_millis(ms: Option<u64>) -> Option<Duration> {
    ms.filter(|n| *n > 0).map(Duration::from_millis)
}

impl Config {
    /// Defaults for everything except the two directories.
    pub fn with_dirs(state_dir: impl Into<PathBuf>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            heartbeat_interval: Duration::from_secs(60),
            rapid_interval: Duration::from_secs(2),
            media_dir: media_dir.into(),
            state_dir: state_dir.into(),
            screen_index: 0,
            player: DEFAULT_PLAYER.to_string(),
            reboot_command: vec!["sudo".to_string(), "reboot".to_string()],
            update_url: format!("{}/download/signaged", DEFAULT_SERVER_URL),
            stop_timeout: Duration::from_secs(5),
            watchdog_interval: Duration::from_secs(5),
            retry_delay: Duration::from_secs(5),
            sweep_interval: crate::poller::SWEEP_INTERVAL,
            cache_retention: crate::poller::CACHE_RETENTION,
        }
    }

    /// Load defaults, then the TOML file, then environment overrides.
    pub fn load() -> Result<Self, LifecycleError> {
        let file = match env::config_path() {
            Some(path) => FileConfig::read(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file)
    }

    /// Layer `file` and the environment over the defaults.
    pub fn resolve(file: FileConfig) -> Result<Self, LifecycleError> {
        let home = dirs::home_dir();
        let state_dir = env::state_dir()
            .or(file.state_dir)
            .or_else(env::xdg_state_dir)
            .or_else(|| home.as_ref().map(|h| h.join(".local/state/signage")))
            .ok_or(LifecycleError::NoStateDir)?;
        let media_dir = env::media_dir()
            .or(file.media_dir)
            .or_else(|| home.as_ref().map(|h| h.join("signage/media")))
            .unwrap_or_else(|| state_dir.join("media"));

        let mut config = Self::with_dirs(state_dir, media_dir);
        if let Some(url) = env::server_url().or(file.server_url) {
            config.server_url = url.trim_end_matches('/').to_string();
        }
        config.update_url = env::update_url()
            .or(file.update_url)
            .unwrap_or_else(|| format!("{}/download/signaged", config.server_url));
        if let Some(id) = env::device_id().or(file.device_id) {
            config.device_id = id;
        }
        if let Some(d) = env::check_interval().or(positive_secs(file.check_interval)) {
            config.heartbeat_interval = d;
        }
        if let Some(d) = env::rapid_check_interval().or(positive_secs(file.rapid_check_interval)) {
            config.rapid_interval = d;
        }
        if let Some(n) = env::screen_index().or(file.screen_index) {
            config.screen_index = n;
        }
        if let Some(player) = env::player().or(file.player) {
            config.player = player;
        }
        if let Some(cmd) = env::reboot_command().or(file.reboot_command) {
            config.reboot_command = cmd;
        }
        if let Some(d) = env::stop_timeout().or(file.stop_timeout_ms.map(Duration::from_millis)) {
            config.stop_timeout = d;
        }
        if let Some(d) = env::watchdog_interval().or(positive_millis(file.watchdog_ms)) {
            config.watchdog_interval = d;
        }
        if let Some(d) = env::retry_delay().or(positive_millis(file.retry_delay_ms)) {
            config.retry_delay = d;
        }
        Ok(config)
    }

    /// Single-instance lock, holding the PID
    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("signaged.pid")
    }

    /// Manifest handed to the player; outside the media dir so the sweep
    /// never sees it
    pub fn manifest_path(&self) -> PathBuf {
        self.state_dir.join("current.m3u")
    }

    /// Daily-rolling agent logs
    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to acquire lock: agent already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Control plane client: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
