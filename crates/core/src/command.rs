// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote operational commands.
//!
//! The server hands out a pending command at most once, on whichever polling
//! channel asks first. Execution on the device must therefore tolerate being
//! asked to do the same thing twice.

use std::fmt;

/// The closed set of commands this agent understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Reboot,
    Update,
    RestartService,
    /// Anything else the server sent. Logged and ignored.
    Unknown(String),
}

impl CommandKind {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "reboot" => Self::Reboot,
            "update" => Self::Update,
            "restart_service" | "restart" => Self::RestartService,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reboot => f.write_str("reboot"),
            Self::Update => f.write_str("update"),
            Self::RestartService => f.write_str("restart_service"),
            Self::Unknown(s) => write!(f, "unknown({s})"),
        }
    }
}

/// A command delivered by either polling channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub kind: CommandKind,
    /// Server-side issue time, as sent.
    pub timestamp: Option<String>,
}

impl PendingCommand {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind, timestamp: None }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
