// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane adapter
//!
//! The remote HTTP API that tells this device what to show and delivers
//! operational commands. Responses are decoded into `signage_core` types at
//! this boundary.
//!
//! | Endpoint                          | Method                         |
//! |-----------------------------------|--------------------------------|
//! | `GET  /devices/{id}/playlist-status` | [`ControlPlane::playlist_status`] |
//! | `GET  /devices/{id}/playlist`     | [`ControlPlane::fetch_content`] |
//! | `POST /devices/{id}/checkin`      | [`ControlPlane::checkin`]      |
//! | `POST /devices/{id}/logs`         | [`ControlPlane::send_log`]     |

mod http;

pub use http::HttpControlPlane;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeControlPlane;

use async_trait::async_trait;
use signage_core::{Assignment, CheckinAck, CheckinReport, DeviceLog, StatusDescriptor, WireError};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::download::DownloadError;

/// Errors from control-plane calls
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Malformed(#[from] WireError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl ControlPlaneError {
    /// Timeouts, refused connections and non-2xx statuses: try again next tick.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Malformed(_))
    }
}

/// Adapter for the remote control plane
#[async_trait]
pub trait ControlPlane: Clone + Send + Sync + 'static {
    /// Lightweight status: current assignment key plus any pending command.
    async fn playlist_status(&self) -> Result<StatusDescriptor, ControlPlaneError>;

    /// Full assignment with item metadata.
    async fn fetch_content(&self) -> Result<Assignment, ControlPlaneError>;

    /// Post telemetry; the response may carry a pending command.
    async fn checkin(&self, report: &CheckinReport) -> Result<CheckinAck, ControlPlaneError>;

    /// Fire-and-forget diagnostics.
    async fn send_log(&self, entry: &DeviceLog) -> Result<(), ControlPlaneError>;

    /// Download the latest agent executable to `dest`. Returns bytes written.
    ///
    /// `dest` is either fully written or absent when this returns.
    async fn download_agent(&self, dest: &Path) -> Result<u64, ControlPlaneError>;
}
