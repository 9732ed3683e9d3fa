// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters for external I/O

pub mod control_plane;
pub mod player;
pub mod system;

pub use control_plane::{ControlPlane, ControlPlaneError, HttpControlPlane};
pub use player::{
    DisplayEnv, PlayerAdapter, PlayerError, PlayerExit, PlayerProcess, ProcessHandle,
    StopOutcome, VlcPlayer,
};
pub use system::{HostSystem, SystemAdapter, SystemError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use control_plane::FakeControlPlane;
#[cfg(any(test, feature = "test-support"))]
pub use player::{FakePlayer, FakeProcess, LaunchRecord};
#[cfg(any(test, feature = "test-support"))]
pub use system::{FakeSystem, SystemCall};
