//! Cancellation context behavior.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use httpc_client::HttpClient;
use tokio_util::sync::CancellationToken;

use support::{fast_config, serve};

#[tokio::test]
async fn pre_cancelled_context_makes_zero_attempts() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "reached"
            }
        }),
    );
    let addr = serve(app).await;
    let client = HttpClient::with_config(fast_config()).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .get(&format!("http://{addr}/"))
        .context(token)
        .send()
        .await
        .unwrap_err();

    assert!(err.is_canceled(), "{err:?}");
    assert_eq!(err.attempts(), Some(0));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelling_during_backoff_stops_the_loop() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/failing",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::SERVICE_UNAVAILABLE, "down")
            }
        }),
    );
    let addr = serve(app).await;

    // Long backoff so the cancel lands mid-sleep.
    let mut config = fast_config();
    config.retry.max_retries = 3;
    config.retry.base_delay = Duration::from_secs(10);
    let client = HttpClient::with_config(config).unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = client
        .get(&format!("http://{addr}/failing"))
        .context(token)
        .send()
        .await
        .unwrap_err();

    assert!(err.is_canceled(), "{err:?}");
    // One attempt completed before the sleep was interrupted.
    assert_eq!(err.attempts(), Some(1));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(5), "woke from sleep");
}

#[tokio::test]
async fn cancelling_inflight_io_aborts() {
    let app = Router::new().route(
        "/hang",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "never"
        }),
    );
    let addr = serve(app).await;
    let client = HttpClient::with_config(fast_config()).unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = client
        .get(&format!("http://{addr}/hang"))
        .context(token)
        .send()
        .await
        .unwrap_err();
    assert!(err.is_canceled(), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}
