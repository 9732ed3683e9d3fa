// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort diagnostics channel to the control plane.
//!
//! Producers never wait: entries go into a bounded queue and are dropped when
//! it is full. A single forwarder posts them; forwarding failures are logged
//! locally and never re-queued.

use crate::adapters::ControlPlane;
use signage_core::{Clock, DeviceLog, LogKind, SystemClock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Queue depth for pending remote log entries
pub const REMOTE_LOG_CAPACITY: usize = 64;

/// Time allowed to flush queued entries at shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Sender half; cheap to clone
#[derive(Clone, Debug)]
pub struct RemoteLog {
    tx: mpsc::Sender<DeviceLog>,
}

impl RemoteLog {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DeviceLog>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogKind::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(LogKind::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogKind::Error, message.into());
    }

    fn push(&self, kind: LogKind, message: String) {
        let entry = DeviceLog { kind, message, timestamp: SystemClock.timestamp() };
        if let Err(e) = self.tx.try_send(entry) {
            tracing::debug!(error = %e, "remote log entry dropped");
        }
    }
}

/// Post queued entries until cancelled, then flush what is left.
pub async fn forward<C: ControlPlane>(
    plane: C,
    mut rx: mpsc::Receiver<DeviceLog>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            entry = rx.recv() => match entry {
                Some(entry) => post(&plane, &entry).await,
                None => return,
            },
        }
    }

    rx.close();
    let drain = async {
        while let Some(entry) = rx.recv().await {
            post(&plane, &entry).await;
        }
    };
    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
        tracing::debug!("remote log drain timed out");
    }
}

async fn post<C: ControlPlane>(plane: &C, entry: &DeviceLog) {
    if let Err(e) = plane.send_log(entry).await {
        tracing::warn!(error = %e, "failed to forward log entry");
    }
}

#[cfg(test)]
#[path = "remote_log_tests.rs"]
mod tests;
