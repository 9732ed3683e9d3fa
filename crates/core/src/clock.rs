// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction so cache ageing and report timestamps are testable.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// A source of wall-clock time
pub trait Clock: Clone + Send + Sync + 'static {
    fn system_time(&self) -> SystemTime;

    /// RFC 3339 timestamp used in control-plane payloads.
    fn timestamp(&self) -> String {
        DateTime::<Utc>::from(self.system_time()).to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Settable clock for tests
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<SystemTime>>,
}

impl FakeClock {
    pub fn at(time: SystemTime) -> Self {
        Self { current: Arc::new(Mutex::new(time)) }
    }

    pub fn new() -> Self {
        Self::at(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
    }

    pub fn set(&self, time: SystemTime) {
        *self.current.lock() = time;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn system_time(&self) -> SystemTime {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
