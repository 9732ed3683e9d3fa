// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::adapters::FakeControlPlane;

#[tokio::test]
async fn entries_are_forwarded_in_order() {
    let plane = FakeControlPlane::new();
    let (log, rx) = RemoteLog::channel(8);
    let token = CancellationToken::new();
    let task = tokio::spawn(forward(plane.clone(), rx, token.clone()));

    log.info("started");
    log.error("download failed");
    drop(log);
    task.await.unwrap();

    let logs = plane.logs();
    assert_eq!(logs.len(), 2);
    assert_eq!((logs[0].kind, logs[0].message.as_str()), (LogKind::Info, "started"));
    assert_eq!((logs[1].kind, logs[1].message.as_str()), (LogKind::Error, "download failed"));
}

#[tokio::test]
async fn full_queue_drops_instead_of_blocking() {
    let (log, mut rx) = RemoteLog::channel(1);
    log.warning("first");
    log.warning("second");

    assert_eq!(rx.recv().await.unwrap().message, "first");
    drop(log);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn forwarding_failures_are_not_retried() {
    let plane = FakeControlPlane::new();
    plane.set_offline(true);
    let (log, rx) = RemoteLog::channel(8);
    let token = CancellationToken::new();
    let task = tokio::spawn(forward(plane.clone(), rx, token.clone()));

    log.error("lost");
    tokio::time::sleep(Duration::from_millis(50)).await;
    plane.set_offline(false);
    log.info("delivered");
    drop(log);
    task.await.unwrap();

    let messages: Vec<_> = plane.logs().into_iter().map(|l| l.message).collect();
    assert_eq!(messages, vec!["delivered".to_string()]);
}

#[tokio::test]
async fn queued_entries_flush_on_shutdown() {
    let plane = FakeControlPlane::new();
    let (log, rx) = RemoteLog::channel(8);
    let token = CancellationToken::new();

    log.info("one");
    log.info("two");
    token.cancel();
    forward(plane.clone(), rx, token).await;

    assert_eq!(plane.logs().len(), 2);
}
