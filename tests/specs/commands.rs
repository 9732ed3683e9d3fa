// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote command specs

use crate::prelude::*;

#[tokio::test]
async fn reboot_stops_playback_then_reboots() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;

    device.plane.queue_command(CommandKind::Reboot);
    eventually(|| device.system.reboot_count() == 1).await;

    assert_eq!(device.player.live_count(), 0);
    assert_eq!(device.player.stop_count(), 1);
    // Held: new content does not restart the player while the host goes down.
    device.plane.set_assignment(three_item_playlist(2, "T1"));
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(device.player.launch_count(), 1);
    device.stop().await;
}

#[tokio::test]
async fn failed_reboot_is_logged_and_polling_continues() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.system.set_fail_reboot(true);
    device.playing().await;

    device.plane.queue_command(CommandKind::Reboot);
    eventually(|| device.system.reboot_count() == 1).await;
    let status = device.wait_for(|s| s.phase == Phase::Playing && !s.halted).await;
    assert_eq!(status.current_media.as_deref(), Some("playlist-1"));

    let polls = device.plane.status_calls();
    eventually(|| device.plane.status_calls() > polls + 2).await;
    eventually(|| device.error_logs().iter().any(|m| m.starts_with("Reboot failed"))).await;

    // Still reacting to content changes.
    device.plane.set_assignment(three_item_playlist(2, "T1"));
    device.wait_for(|s| s.current_media.as_deref() == Some("playlist-2")).await;
    device.stop().await;
}

#[tokio::test]
async fn repeated_reboot_delivery_reboots_once() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;

    device.plane.queue_command(CommandKind::Reboot);
    eventually(|| device.system.reboot_count() == 1).await;
    device.plane.queue_command(CommandKind::Reboot);
    eventually(|| device.plane.status_calls() > 3).await;
    tokio::time::sleep(TICK * 4).await;

    assert_eq!(device.system.reboot_count(), 1);
    device.stop().await;
}

#[tokio::test]
async fn update_replaces_executable_and_exits() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.plane.set_artifact(Some(b"agent v2".to_vec()));
    device.playing().await;

    device.plane.queue_command(CommandKind::Update);
    let system = device.system.clone();
    let player = device.player.clone();

    assert_eq!(device.exited().await, ExitReason::Updated);
    let installs: Vec<_> =
        system.calls().into_iter().filter(|c| *c != SystemCall::TeamviewerId).collect();
    assert_eq!(installs, vec![SystemCall::InstallUpdate { bytes: b"agent v2".to_vec() }]);
    assert_eq!(player.live_count(), 0);
}

#[tokio::test]
async fn failed_update_leaves_agent_running() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;

    device.plane.queue_command(CommandKind::Update);
    eventually(|| device.error_logs().iter().any(|m| m.starts_with("Update failed"))).await;

    assert_eq!(device.status().phase, Phase::Playing);
    assert!(device.system.calls().iter().all(|c| !matches!(c, SystemCall::InstallUpdate { .. })));
    assert_eq!(device.stop().await, ExitReason::Signal);
}

#[tokio::test]
async fn restart_service_exits_cleanly() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;
    let player = device.player.clone();

    device.plane.queue_command(CommandKind::RestartService);

    assert_eq!(device.exited().await, ExitReason::RestartRequested);
    assert_eq!(player.live_count(), 0);
}

#[tokio::test]
async fn unknown_command_changes_nothing() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;

    device.plane.queue_command(CommandKind::parse("self_destruct"));
    let polls = device.plane.status_calls();
    eventually(|| device.plane.status_calls() > polls + 2).await;

    assert_eq!(device.status().phase, Phase::Playing);
    assert!(device.system.calls().iter().all(|c| *c == SystemCall::TeamviewerId));
    assert_eq!(device.stop().await, ExitReason::Signal);
}
