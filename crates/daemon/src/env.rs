// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent.
//!
//! Every function returns `None` when the variable is unset or unparseable;
//! defaults live in [`crate::lifecycle::Config`].

use std::path::PathBuf;
use std::time::Duration;

/// Agent version reported in checkins
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn secs(key: &str) -> Option<Duration> {
    var(key).and_then(|s| s.trim().parse::<u64>().ok()).filter(|n| *n > 0).map(Duration::from_secs)
}

fn millis(key: &str) -> Option<Duration> {
    var(key).and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_millis)
}

/// Path of the optional TOML config file: SIGNAGE_CONFIG > XDG_CONFIG_HOME/signage/agent.toml
/// > ~/.config/signage/agent.toml
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = var("SIGNAGE_CONFIG") {
        return Some(PathBuf::from(path));
    }
    if let Some(xdg) = var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("signage/agent.toml"));
    }
    dirs::home_dir().map(|home| home.join(".config/signage/agent.toml"))
}

pub fn server_url() -> Option<String> {
    var("SIGNAGE_SERVER_URL")
}

pub fn device_id() -> Option<String> {
    var("DEVICE_ID")
}

/// Heartbeat interval (seconds)
pub fn check_interval() -> Option<Duration> {
    secs("CHECK_INTERVAL")
}

/// Rapid status poll interval (seconds)
pub fn rapid_check_interval() -> Option<Duration> {
    secs("RAPID_CHECK_INTERVAL")
}

pub fn media_dir() -> Option<PathBuf> {
    var("MEDIA_DIR").map(PathBuf::from)
}

/// Explicit state directory override (SIGNAGE_STATE_DIR)
pub fn state_dir() -> Option<PathBuf> {
    var("SIGNAGE_STATE_DIR").map(PathBuf::from)
}

/// XDG_STATE_HOME/signage; ranks below the config file
pub fn xdg_state_dir() -> Option<PathBuf> {
    var("XDG_STATE_HOME").map(|xdg| PathBuf::from(xdg).join("signage"))
}

pub fn screen_index() -> Option<u32> {
    var("SCREEN_INDEX").and_then(|s| s.trim().parse().ok())
}

/// Player binary (default `vlc`)
pub fn player() -> Option<String> {
    var("SIGNAGE_PLAYER")
}

/// Reboot command line, whitespace separated (default `sudo reboot`)
pub fn reboot_command() -> Option<Vec<String>> {
    var("SIGNAGE_REBOOT_COMMAND").map(|s| s.split_whitespace().map(str::to_string).collect())
}

pub fn update_url() -> Option<String> {
    var("SIGNAGE_UPDATE_URL")
}

/// Grace period between terminate and kill when stopping the player
pub fn stop_timeout() -> Option<Duration> {
    millis("SIGNAGE_STOP_TIMEOUT_MS")
}

/// Player liveness check cadence
pub fn watchdog_interval() -> Option<Duration> {
    millis("SIGNAGE_WATCHDOG_MS").filter(|d| !d.is_zero())
}

/// Delay before retrying a failed prepare/launch
pub fn retry_delay() -> Option<Duration> {
    millis("SIGNAGE_RETRY_DELAY_MS").filter(|d| !d.is_zero())
}

pub fn wayland_display() -> Option<String> {
    var("WAYLAND_DISPLAY")
}

pub fn x_display() -> Option<String> {
    var("DISPLAY")
}

pub fn xauthority() -> Option<PathBuf> {
    var("XAUTHORITY").map(PathBuf::from)
}
