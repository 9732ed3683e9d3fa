// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane payloads.
//!
//! Responses are decoded exactly once, here, into typed values. Nothing past
//! this module inspects raw JSON or checks which keys happen to be present.

use crate::assignment::{Assignment, AssignmentKey, AssignmentKind, Playlist, SingleMedia};
use crate::command::{CommandKind, PendingCommand};
use crate::media::MediaItem;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors decoding a control-plane response body.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a response body that must be a JSON object.
///
/// serde accepts a sequence for a struct and fills fields by position, so the
/// shape is checked before the typed decode.
fn decode_object<T: DeserializeOwned>(body: &[u8]) -> Result<T, WireError> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(WireError::NotAnObject(json_kind(&value)));
    }
    Ok(serde_json::from_value(value)?)
}

// ── playlist-status ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(default)]
    playlist_id: Option<i64>,
    #[serde(default)]
    media_id: Option<i64>,
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    command_timestamp: Option<String>,
}

/// Result of the lightweight rapid poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDescriptor {
    /// What the server currently assigns, or `None` for nothing.
    pub remote: Option<AssignmentKey>,
    pub command: Option<PendingCommand>,
}

pub fn decode_status(body: &[u8]) -> Result<StatusDescriptor, WireError> {
    let raw: RawStatus = decode_object(body)?;
    let remote = match (raw.playlist_id, raw.media_id) {
        (Some(id), _) => Some(AssignmentKey::new(AssignmentKind::Playlist, id, raw.last_updated)),
        (None, Some(id)) => Some(AssignmentKey::new(AssignmentKind::Media, id, raw.last_updated)),
        (None, None) => None,
    };
    Ok(StatusDescriptor { remote, command: pending_command(raw.command, raw.command_timestamp) })
}

// ── playlist (full fetch) ───────────────────────────────────────────────────

fn default_loop() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(rename = "loop", default = "default_loop")]
    looping: bool,
    #[serde(default)]
    default_duration: Option<u32>,
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    items: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    #[serde(flatten)]
    item: MediaItem,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    #[serde(default)]
    playlist: Option<RawPlaylist>,
    #[serde(default)]
    media: Option<RawMedia>,
}

/// Decode the full content response into an [`Assignment`].
///
/// If a server sends both keys the playlist wins; the variants are exclusive.
pub fn decode_content(body: &[u8]) -> Result<Assignment, WireError> {
    let raw: RawContent = decode_object(body)?;
    Ok(match (raw.playlist, raw.media) {
        (Some(p), _) => Assignment::Playlist(Playlist {
            id: p.id,
            name: p.name,
            looping: p.looping,
            default_duration: p.default_duration,
            last_updated: p.last_updated,
            items: p.items,
        }),
        (None, Some(m)) => {
            Assignment::SingleMedia(SingleMedia { item: m.item, last_updated: m.last_updated })
        }
        (None, None) => Assignment::None,
    })
}

// ── checkin ─────────────────────────────────────────────────────────────────

/// Heartbeat body posted to `/checkin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinReport {
    pub current_media: Option<String>,
    pub timestamp: String,
    pub client_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teamviewer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCheckinAck {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    assignment_id: Option<i64>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    command_timestamp: Option<String>,
}

/// Decoded `/checkin` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinAck {
    pub status: Option<String>,
    pub assignment_id: Option<i64>,
    pub command: Option<PendingCommand>,
}

pub fn decode_checkin(body: &[u8]) -> Result<CheckinAck, WireError> {
    let raw: RawCheckinAck = decode_object(body)?;
    Ok(CheckinAck {
        status: raw.status,
        assignment_id: raw.assignment_id,
        command: pending_command(raw.command, raw.command_timestamp),
    })
}

fn pending_command(command: Option<String>, timestamp: Option<String>) -> Option<PendingCommand> {
    let text = command.filter(|c| !c.trim().is_empty())?;
    Some(PendingCommand { kind: CommandKind::parse(&text), timestamp })
}

// ── logs ────────────────────────────────────────────────────────────────────

/// Severity tag of a remote diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
}

/// Body posted to `/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceLog {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub timestamp: String,
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
