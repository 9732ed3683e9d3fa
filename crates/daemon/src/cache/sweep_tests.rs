// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs::File;
use tempfile::TempDir;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn file_aged(dir: &Path, name: &str, now: SystemTime, age: Duration) {
    let path = dir.join(name);
    std::fs::write(&path, b"x").unwrap();
    File::options().append(true).open(&path).unwrap().set_modified(now - age).unwrap();
}

fn referenced(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn referenced_files_survive_any_age() {
    let dir = TempDir::new().unwrap();
    let now = SystemTime::now();
    file_aged(dir.path(), "keep.jpg", now, DAY * 30);

    let report = sweep(dir.path(), &referenced(&["keep.jpg"]), now, DAY).unwrap();

    assert!(report.removed.is_empty());
    assert_eq!(report.kept_referenced, 1);
    assert!(dir.path().join("keep.jpg").exists());
}

#[test]
fn unreferenced_files_kept_until_retention_elapses() {
    let dir = TempDir::new().unwrap();
    let now = SystemTime::now();
    file_aged(dir.path(), "recent.mp4", now, Duration::from_secs(60 * 60));
    file_aged(dir.path(), "stale.mp4", now, DAY + Duration::from_secs(1));

    let report = sweep(dir.path(), &BTreeSet::new(), now, DAY).unwrap();

    assert_eq!(report.removed, vec!["stale.mp4".to_string()]);
    assert_eq!(report.kept_recent, 1);
    assert!(dir.path().join("recent.mp4").exists());
    assert!(!dir.path().join("stale.mp4").exists());
}

#[test]
fn stale_partial_downloads_are_removed() {
    let dir = TempDir::new().unwrap();
    let now = SystemTime::now();
    file_aged(dir.path(), ".clip.mp4.0123abcd.part", now, DAY * 2);

    let report = sweep(dir.path(), &referenced(&["clip.mp4"]), now, DAY).unwrap();

    assert_eq!(report.removed, vec![".clip.mp4.0123abcd.part".to_string()]);
}

#[test]
fn directories_are_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let report = sweep(dir.path(), &BTreeSet::new(), SystemTime::now(), Duration::ZERO).unwrap();

    assert_eq!(report, SweepReport::default());
    assert!(dir.path().join("nested").exists());
}

#[test]
fn missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let gone = dir.path().join("gone");
    assert!(sweep(&gone, &BTreeSet::new(), SystemTime::now(), DAY).is_err());
}

proptest::proptest! {
    #[test]
    fn sweep_never_removes_referenced(
        ages in proptest::collection::vec(0u64..200, 1..8),
        keep_mask in proptest::collection::vec(proptest::bool::ANY, 8),
    ) {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        let retention = Duration::from_secs(100);
        let mut keep = BTreeSet::new();
        for (i, age) in ages.iter().enumerate() {
            let name = format!("f{i}.jpg");
            file_aged(dir.path(), &name, now, Duration::from_secs(*age));
            if keep_mask[i] {
                keep.insert(name);
            }
        }

        sweep(dir.path(), &keep, now, retention).unwrap();

        for (i, age) in ages.iter().enumerate() {
            let name = format!("f{i}.jpg");
            let exists = dir.path().join(&name).exists();
            if keep.contains(&name) {
                proptest::prop_assert!(exists);
            } else {
                proptest::prop_assert_eq!(exists, *age < 100);
            }
        }
    }
}
