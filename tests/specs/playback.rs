// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content sync and playback supervision specs

use crate::prelude::*;

// =============================================================================
// First assignment
// =============================================================================

#[tokio::test]
async fn first_playlist_starts_one_looping_manifest() {
    let device = Device::new(Assignment::None).boot().await;
    assert_eq!(device.status().phase, Phase::Idle);

    device.plane.set_assignment(three_item_playlist(1, "T1"));
    let status = device.playing().await;

    assert_eq!(status.current_media.as_deref(), Some("playlist-1"));
    let launch = device.player.last_launch().unwrap();
    assert_eq!(launch.manifest.len(), 3);
    assert!(launch.manifest.looping());

    // Steady state: no restarts while nothing changes.
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(device.player.launch_count(), 1);
    assert_eq!(device.player.stop_count(), 0);
    assert_eq!(device.stop().await, ExitReason::Signal);
}

#[tokio::test]
async fn heartbeat_reports_current_media() {
    let device = Device::new(three_item_playlist(3, "T1")).boot().await;
    device.playing().await;

    eventually(|| {
        device.plane.checkins().iter().any(|c| c.current_media.as_deref() == Some("playlist-3"))
    })
    .await;
    device.stop().await;
}

// =============================================================================
// Assignment changes
// =============================================================================

#[tokio::test]
async fn in_place_edit_with_same_id_rebuilds_manifest() {
    let device = Device::new(three_item_playlist(5, "T1")).boot().await;
    device.playing().await;

    device.plane.set_assignment(playlist(5, "T2", vec![image(3, "c.jpg"), image(1, "a.jpg")]));
    eventually(|| device.player.launch_count() == 2).await;
    device.playing().await;

    let titles: Vec<_> = device
        .player
        .last_launch()
        .unwrap()
        .manifest
        .entries()
        .iter()
        .map(|e| e.title.clone())
        .collect();
    assert_eq!(titles, vec!["orig-c.jpg", "orig-a.jpg"]);
    assert_eq!(device.player.max_live(), 1);
    device.stop().await;
}

#[tokio::test]
async fn unassigning_stops_playback() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;

    device.plane.set_assignment(Assignment::None);
    let status = device.wait_for(|s| s.phase == Phase::Idle && s.assignment.is_none()).await;

    assert_eq!(status.current_media, None);
    assert_eq!(device.player.live_count(), 0);
    device.stop().await;
}

#[tokio::test]
async fn rapid_assignment_churn_never_overlaps_players() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.media.set_delay(Some(Duration::from_millis(5)));

    for (id, ts) in [(2, "T1"), (2, "T2"), (3, "T1"), (1, "T9"), (4, "T1")] {
        device.plane.set_assignment(three_item_playlist(id, ts));
        tokio::time::sleep(TICK).await;
        device.player.crash_current();
    }
    let status = device.wait_for(|s| s.current_media.as_deref() == Some("playlist-4")).await;

    assert_eq!(status.phase, Phase::Playing);
    assert_eq!(device.player.max_live(), 1);
    device.stop().await;
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn failed_download_skips_item_and_reports_once() {
    let device = Device::new(Assignment::None);
    device.media.fail("b.jpg");
    device.plane.set_assignment(three_item_playlist(1, "T1"));
    let device = device.boot().await;
    device.playing().await;

    let manifest = device.player.last_launch().unwrap().manifest;
    let titles: Vec<_> = manifest.entries().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["orig-a.jpg", "orig-c.jpg"]);

    tokio::time::sleep(TICK * 4).await;
    let errors = device.error_logs();
    assert_eq!(errors.iter().filter(|m| m.contains("orig-b.jpg")).count(), 1);
    device.stop().await;
}

#[tokio::test]
async fn crashed_player_is_restarted_with_same_content() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    let first = device.playing().await;

    assert!(device.player.crash_current());
    let second = device.wait_for(|s| s.phase == Phase::Playing && s.pid != first.pid).await;

    assert_eq!(second.assignment, first.assignment);
    assert_eq!(device.player.launch_count(), 2);
    assert_eq!(device.player.last_launch().unwrap().manifest.len(), 3);
    assert_eq!(device.plane.fetch_calls(), 1);
    device.stop().await;
}

#[tokio::test]
async fn server_outage_keeps_current_content_playing() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;

    device.plane.set_offline(true);
    tokio::time::sleep(TICK * 6).await;

    assert_eq!(device.status().phase, Phase::Playing);
    assert_eq!(device.player.launch_count(), 1);
    device.plane.set_offline(false);
    device.stop().await;
}

#[tokio::test]
async fn shutdown_stops_the_player() {
    let device = Device::new(three_item_playlist(1, "T1")).boot().await;
    device.playing().await;
    let player = device.player.clone();

    assert_eq!(device.stop().await, ExitReason::Signal);

    assert_eq!(player.live_count(), 0);
    assert_eq!(player.stop_count(), 1);
}
