// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! signage-core: data model and wire decoding for the signage agent

pub mod assignment;
pub mod clock;
pub mod command;
pub mod manifest;
pub mod media;
pub mod wire;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use assignment::{
    key_changed, Assignment, AssignmentKey, AssignmentKind, Playlist, SingleMedia,
    DEFAULT_IMAGE_SECS,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{CommandKind, PendingCommand};
pub use manifest::{Manifest, ManifestEntry};
pub use media::{validate_stream_url, FileType, MediaError, MediaItem, PlaybackSource};
pub use wire::{
    decode_checkin, decode_content, decode_status, CheckinAck, CheckinReport, DeviceLog, LogKind,
    StatusDescriptor, WireError,
};
