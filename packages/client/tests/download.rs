//! Download subsystem: fresh downloads, resume, 416 and destination
//! handling.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use httpc_client::DownloadOptions;

use support::{fast_client, serve};

const FILE_SIZE: usize = 1024;

fn file_bytes() -> Vec<u8> {
    (0..FILE_SIZE).map(|i| (i % 251) as u8).collect()
}

/// Serves a 1 KiB file with `Range: bytes=<start>-` support.
async fn ranged_file(request: Request) -> Response {
    let data = file_bytes();
    let range = request
        .headers()
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("bytes="))
        .and_then(|v| v.trim_end_matches('-').parse::<usize>().ok());
    match range {
        Some(start) if start >= data.len() => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{}", data.len()))],
        )
            .into_response(),
        Some(start) => (
            StatusCode::PARTIAL_CONTENT,
            [(
                header::CONTENT_RANGE,
                format!("bytes {start}-{}/{}", data.len() - 1, data.len()),
            )],
            data[start..].to_vec(),
        )
            .into_response(),
        None => data.into_response(),
    }
}

fn file_app() -> Router {
    Router::new().route("/file.bin", get(ranged_file))
}

#[tokio::test]
async fn fresh_download() {
    let addr = serve(file_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("fresh.bin");
    let client = fast_client();

    let result = client
        .download_file(&format!("http://{addr}/file.bin"), dest.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(result.status(), StatusCode::OK);
    assert_eq!(result.bytes_written(), FILE_SIZE as u64);
    assert!(!result.resumed());
    assert_eq!(result.content_length(), Some(FILE_SIZE as u64));
    assert_eq!(std::fs::read(&dest).unwrap(), file_bytes());
}

#[tokio::test]
async fn resume_completes_a_partial_file() {
    let addr = serve(file_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("partial.bin");
    std::fs::write(&dest, &file_bytes()[..512]).unwrap();
    let client = fast_client();

    let result = client
        .download_with_options(
            &format!("http://{addr}/file.bin"),
            DownloadOptions::new(dest.to_str().unwrap()).resume(true),
        )
        .await
        .unwrap();

    assert_eq!(result.status(), StatusCode::PARTIAL_CONTENT);
    assert!(result.resumed());
    assert_eq!(result.bytes_written(), 512);
    assert_eq!(result.content_length(), Some(FILE_SIZE as u64));
    let on_disk = std::fs::read(&dest).unwrap();
    assert_eq!(on_disk.len(), FILE_SIZE);
    assert_eq!(on_disk, file_bytes());
}

#[tokio::test]
async fn existing_destination_without_flags_fails() {
    let addr = serve(file_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("existing.bin");
    std::fs::write(&dest, b"old content").unwrap();
    let client = fast_client();

    let err = client
        .download_file(&format!("http://{addr}/file.bin"), dest.to_str().unwrap())
        .await
        .unwrap_err();
    assert!(err.is_file(), "{err:?}");
    // Untouched on failure.
    assert_eq!(std::fs::read(&dest).unwrap(), b"old content");
}

#[tokio::test]
async fn overwrite_replaces_the_destination() {
    let addr = serve(file_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("replace.bin");
    std::fs::write(&dest, b"stale").unwrap();
    let client = fast_client();

    let result = client
        .download_with_options(
            &format!("http://{addr}/file.bin"),
            DownloadOptions::new(dest.to_str().unwrap()).overwrite(true),
        )
        .await
        .unwrap();

    assert!(!result.resumed());
    assert_eq!(std::fs::read(&dest).unwrap(), file_bytes());
}

#[tokio::test]
async fn already_complete_resume_returns_416_success() {
    let addr = serve(file_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("complete.bin");
    std::fs::write(&dest, file_bytes()).unwrap();
    let client = fast_client();

    let result = client
        .download_with_options(
            &format!("http://{addr}/file.bin"),
            DownloadOptions::new(dest.to_str().unwrap()).resume(true),
        )
        .await
        .unwrap();

    assert_eq!(result.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(result.bytes_written(), 0);
    assert!(!result.resumed());
    assert_eq!(std::fs::read(&dest).unwrap(), file_bytes());
}

#[tokio::test]
async fn progress_reports_cumulative_position() {
    let addr = serve(file_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("progress.bin");
    let client = fast_client();

    let seen: Arc<Mutex<Vec<(u64, Option<u64>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let options = DownloadOptions::new(dest.to_str().unwrap())
        .progress_interval(Duration::ZERO)
        .progress(move |downloaded, total, _speed| {
            sink.lock().unwrap().push((downloaded, total));
        });

    client
        .download_with_options(&format!("http://{addr}/file.bin"), options)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    let (last_downloaded, last_total) = *seen.last().unwrap();
    assert_eq!(last_downloaded, FILE_SIZE as u64);
    assert_eq!(last_total, Some(FILE_SIZE as u64));
}

#[tokio::test]
async fn system_directories_are_refused() {
    let addr = serve(file_app()).await;
    let client = fast_client();
    let err = client
        .download_file(&format!("http://{addr}/file.bin"), "/etc/httpc-test.bin")
        .await
        .unwrap_err();
    assert!(err.is_builder(), "{err:?}");
}

#[tokio::test]
async fn error_statuses_fail_the_download() {
    let addr = serve(file_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing.bin");
    let client = fast_client();

    let err = client
        .download_file(&format!("http://{addr}/nope.bin"), dest.to_str().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(!dest.exists());
}
