// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signage agent library
//!
//! Keeps one display in sync with its server-side assignment: polls the
//! control plane, caches media, supervises the player process and executes
//! remote commands. The `signaged` binary is a thin wrapper around
//! [`lifecycle::startup`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod cache;
pub mod download;
pub mod env;
pub mod executor;
pub mod lifecycle;
pub mod poller;
pub mod remote_log;
pub mod resolver;
pub mod shutdown;
pub mod supervisor;

pub use executor::{CommandExecutor, CommandOutcome};
pub use lifecycle::{Config, LifecycleError};
pub use resolver::{ContentResolver, ResolveError};
pub use shutdown::{ExitReason, Shutdown};
pub use supervisor::{Phase, PlaybackStatus, Supervisor, SupervisorConfig, SupervisorHandle};
