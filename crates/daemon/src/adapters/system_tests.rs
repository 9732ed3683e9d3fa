// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

#[yare::parameterized(
    plain = { "TeamViewer ID: 123456789", Some("123456789") },
    padded = { "  TeamViewer ID:   987654321  ", Some("987654321") },
    trailing_text = { "TeamViewer ID: 42 (online)", Some("42") },
    no_digits = { "TeamViewer ID: not assigned", None },
    absent = { "TeamViewer 15.1.3", None },
)]
fn parses_teamviewer_id(line: &str, expected: Option<&str>) {
    let output = format!("TeamViewer 15.1.3\n{}\nStatus: online\n", line);
    assert_eq!(parse_teamviewer_id(&output).as_deref(), expected);
}

#[tokio::test]
async fn install_update_replaces_exe_and_marks_executable() {
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("signaged");
    std::fs::write(&exe, b"old").unwrap();
    let host = HostSystem::new(vec!["true".into()], exe.clone());

    let staged = host.update_staging_path();
    assert_eq!(staged.parent(), exe.parent());
    std::fs::write(&staged, b"new").unwrap();

    host.install_update(&staged).await.unwrap();

    assert_eq!(std::fs::read(&exe).unwrap(), b"new");
    assert!(!staged.exists());
    let mode = std::fs::metadata(&exe).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[tokio::test]
async fn install_update_failure_leaves_exe_untouched() {
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("signaged");
    std::fs::write(&exe, b"old").unwrap();
    let host = HostSystem::new(vec![], exe.clone());

    let err = host.install_update(&dir.path().join("missing")).await.unwrap_err();
    assert!(matches!(err, SystemError::Io { .. }));
    assert_eq!(std::fs::read(&exe).unwrap(), b"old");
}

#[tokio::test]
async fn reboot_reports_command_failure() {
    let host = HostSystem::new(vec!["false".into()], PathBuf::from("/tmp/x"));
    assert!(matches!(host.reboot().await, Err(SystemError::CommandFailed { .. })));
}

#[tokio::test]
async fn reboot_succeeds_when_command_succeeds() {
    let host = HostSystem::new(vec!["true".into()], PathBuf::from("/tmp/x"));
    host.reboot().await.unwrap();
}

#[tokio::test]
async fn empty_reboot_command_is_rejected() {
    let host = HostSystem::new(vec![], PathBuf::from("/tmp/x"));
    assert!(matches!(host.reboot().await, Err(SystemError::NoRebootCommand)));
}
