// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ControlPlane, ControlPlaneError};
use async_trait::async_trait;
use parking_lot::Mutex;
use signage_core::{
    Assignment, CheckinAck, CheckinReport, CommandKind, DeviceLog, PendingCommand,
    StatusDescriptor,
};
use std::path::Path;
use std::sync::Arc;

#[derive(Default)]
struct FakeControlPlaneState {
    assignment: Assignment,
    command: Option<PendingCommand>,
    offline: bool,
    fail_fetch: bool,
    artifact: Option<Vec<u8>>,
    checkins: Vec<CheckinReport>,
    logs: Vec<DeviceLog>,
    status_calls: usize,
    fetch_calls: usize,
}

/// In-memory control plane for testing
///
/// Holds the server-side view of one device. A queued command is delivered
/// once, by whichever of the status poll or checkin sees it first.
#[derive(Clone, Default)]
pub struct FakeControlPlane {
    inner: Arc<Mutex<FakeControlPlaneState>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_assignment(&self, assignment: Assignment) {
        self.inner.lock().assignment = assignment;
    }

    pub fn queue_command(&self, kind: CommandKind) {
        self.inner.lock().command = Some(PendingCommand::new(kind));
    }

    /// Every call fails with a transport error while offline.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// Only the full fetch fails; status and checkin still answer.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.inner.lock().fail_fetch = fail;
    }

    /// Bytes served by `download_agent`; `None` answers 404.
    pub fn set_artifact(&self, bytes: Option<Vec<u8>>) {
        self.inner.lock().artifact = bytes;
    }

    pub fn checkins(&self) -> Vec<CheckinReport> {
        self.inner.lock().checkins.clone()
    }

    pub fn logs(&self) -> Vec<DeviceLog> {
        self.inner.lock().logs.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.inner.lock().status_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.inner.lock().fetch_calls
    }

    fn check_online(state: &FakeControlPlaneState) -> Result<(), ControlPlaneError> {
        if state.offline {
            return Err(ControlPlaneError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn playlist_status(&self) -> Result<StatusDescriptor, ControlPlaneError> {
        let mut state = self.inner.lock();
        state.status_calls += 1;
        Self::check_online(&state)?;
        Ok(StatusDescriptor { remote: state.assignment.key(), command: state.command.take() })
    }

    async fn fetch_content(&self) -> Result<Assignment, ControlPlaneError> {
        let mut state = self.inner.lock();
        state.fetch_calls += 1;
        Self::check_online(&state)?;
        if state.fail_fetch {
            return Err(ControlPlaneError::Status { status: 503, body: "unavailable".into() });
        }
        Ok(state.assignment.clone())
    }

    async fn checkin(&self, report: &CheckinReport) -> Result<CheckinAck, ControlPlaneError> {
        let mut state = self.inner.lock();
        Self::check_online(&state)?;
        state.checkins.push(report.clone());
        Ok(CheckinAck {
            status: Some("ok".to_string()),
            assignment_id: state.assignment.key().map(|k| k.id),
            command: state.command.take(),
        })
    }

    async fn send_log(&self, entry: &DeviceLog) -> Result<(), ControlPlaneError> {
        let mut state = self.inner.lock();
        Self::check_online(&state)?;
        state.logs.push(entry.clone());
        Ok(())
    }

    async fn download_agent(&self, dest: &Path) -> Result<u64, ControlPlaneError> {
        let artifact = {
            let state = self.inner.lock();
            Self::check_online(&state)?;
            state.artifact.clone()
        };
        let Some(bytes) = artifact else {
            return Err(ControlPlaneError::Status { status: 404, body: String::new() });
        };
        tokio::fs::write(dest, &bytes).await.map_err(crate::download::DownloadError::from)?;
        Ok(bytes.len() as u64)
    }
}
