// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reqwest-backed control plane.
//!
//! Each call carries its own bound: 5 s for the rapid status poll and log
//! posts, 10 s for the full fetch and checkin. Agent downloads use the
//! per-chunk idle bound from [`crate::download`].

use super::{ControlPlane, ControlPlaneError};
use crate::download;
use async_trait::async_trait;
use signage_core::{
    decode_checkin, decode_content, decode_status, Assignment, CheckinAck, CheckinReport,
    DeviceLog, StatusDescriptor,
};
use std::path::Path;
use std::time::Duration;

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const CHECKIN_TIMEOUT: Duration = Duration::from_secs(10);
const LOG_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DOWNLOAD_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in [`ControlPlaneError::Status`]
const ERROR_BODY_LIMIT: usize = 200;

/// Control plane reached over HTTP(S)
#[derive(Clone, Debug)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    /// `{server}/api/devices/{device_id}`
    device_base: String,
    update_url: String,
}

impl HttpControlPlane {
    pub fn new(
        server_url: &str,
        device_id: &str,
        update_url: impl Into<String>,
    ) -> Result<Self, ControlPlaneError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("signaged/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ControlPlaneError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, server_url, device_id, update_url))
    }

    pub fn with_client(
        client: reqwest::Client,
        server_url: &str,
        device_id: &str,
        update_url: impl Into<String>,
    ) -> Self {
        let device_base = format!("{}/api/devices/{}", server_url.trim_end_matches('/'), device_id);
        Self { client, device_base, update_url: update_url.into() }
    }

    /// Shared client, reused by the media cache.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.device_base, endpoint)
    }

    async fn read_body(
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<Vec<u8>, ControlPlaneError> {
        let response = request.timeout(timeout).send().await.map_err(|e| classify(e, timeout))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| classify(e, timeout))?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let body = text.trim().chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ControlPlaneError::Status { status: status.as_u16(), body });
        }
        Ok(body.to_vec())
    }
}

fn classify(e: reqwest::Error, timeout: Duration) -> ControlPlaneError {
    if e.is_timeout() {
        ControlPlaneError::Timeout(timeout)
    } else {
        ControlPlaneError::Transport(e.to_string())
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn playlist_status(&self) -> Result<StatusDescriptor, ControlPlaneError> {
        let body =
            Self::read_body(self.client.get(self.url("playlist-status")), STATUS_TIMEOUT).await?;
        Ok(decode_status(&body)?)
    }

    async fn fetch_content(&self) -> Result<Assignment, ControlPlaneError> {
        let body = Self::read_body(self.client.get(self.url("playlist")), FETCH_TIMEOUT).await?;
        Ok(decode_content(&body)?)
    }

    async fn checkin(&self, report: &CheckinReport) -> Result<CheckinAck, ControlPlaneError> {
        let request = self.client.post(self.url("checkin")).json(report);
        let body = Self::read_body(request, CHECKIN_TIMEOUT).await?;
        Ok(decode_checkin(&body)?)
    }

    async fn send_log(&self, entry: &DeviceLog) -> Result<(), ControlPlaneError> {
        let request = self.client.post(self.url("logs")).json(entry);
        Self::read_body(request, LOG_TIMEOUT).await.map(|_| ())
    }

    async fn download_agent(&self, dest: &Path) -> Result<u64, ControlPlaneError> {
        Ok(download::fetch_to(&self.client, &self.update_url, dest, DOWNLOAD_IDLE_TIMEOUT).await?)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
