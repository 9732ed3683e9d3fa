// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide "keep running" flag.
//!
//! Every long-running task observes the same token. The first request also
//! records why the agent is exiting, which `main` logs on the way out.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why the agent stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// SIGTERM / SIGINT from the init system or an operator.
    Signal,
    /// `restart_service` command from the server.
    RestartRequested,
    /// A new executable was installed by the `update` command.
    Updated,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Signal => "signal",
            Self::RestartRequested => "restart requested",
            Self::Updated => "updated",
        })
    }
}

/// Cloneable shutdown handle shared by all tasks.
#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    reason: Arc<Mutex<Option<ExitReason>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `false` if a shutdown was already requested;
    /// the first reason is kept.
    pub fn request(&self, reason: ExitReason) -> bool {
        let first = {
            let mut slot = self.reason.lock();
            if slot.is_some() {
                false
            } else {
                *slot = Some(reason);
                true
            }
        };
        self.token.cancel();
        first
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<ExitReason> {
        *self.reason.lock()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Resolves once shutdown has been requested.
    pub async fn requested(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
