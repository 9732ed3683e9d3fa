// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn leftovers(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path(route)).respond_with(response).mount(&server).await;
    server
}

#[tokio::test]
async fn downloads_and_publishes() {
    let server =
        serve("/uploads/a.jpg", ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
            .await;
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("a.jpg");

    let client = reqwest::Client::new();
    let url = format!("{}/uploads/a.jpg", server.uri());
    let n = fetch_to(&client, &url, &dest, Duration::from_secs(5)).await.unwrap();

    assert_eq!(n, 10);
    assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg-bytes");
    assert_eq!(leftovers(dir.path()), vec!["a.jpg".to_string()]);
}

#[tokio::test]
async fn http_error_leaves_nothing() {
    let server = serve("/uploads/a.jpg", ResponseTemplate::new(500)).await;
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("a.jpg");

    let url = format!("{}/uploads/a.jpg", server.uri());
    let err = fetch_to(&reqwest::Client::new(), &url, &dest, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Status(500)));
    assert!(leftovers(dir.path()).is_empty());
}

#[tokio::test]
async fn stalled_server_times_out() {
    let server = serve(
        "/slow.mp4",
        ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()).set_delay(Duration::from_secs(5)),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("slow.mp4");

    let url = format!("{}/slow.mp4", server.uri());
    let err = fetch_to(&reqwest::Client::new(), &url, &dest, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Stalled(_)));
    assert!(!dest.exists());
    assert!(leftovers(dir.path()).is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("a.jpg");

    let url = "http://127.0.0.1:1/a.jpg";
    let err =
        fetch_to(&reqwest::Client::new(), url, &dest, Duration::from_secs(5)).await.unwrap_err();

    assert!(matches!(err, DownloadError::Request(_)));
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn partial_file_is_hidden_and_removed_on_drop() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("clip.mp4");
    let partial = PartialFile::beside(&dest);
    let name = partial.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(".clip.mp4."));
    assert!(name.ends_with(PARTIAL_SUFFIX));

    std::fs::write(partial.path(), b"half").unwrap();
    let path = partial.path().to_path_buf();
    drop(partial);
    assert!(!path.exists());
}
