//! Admission control under concurrent load.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use futures_util::future::join_all;
use httpc_client::HttpClient;

use support::{fast_config, serve};

/// Tracks the highest number of handlers running at once.
fn watched_app(active: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/busy",
        get(move || {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(80)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                "done"
            }
        }),
    )
}

#[tokio::test]
async fn per_host_cap_bounds_simultaneous_requests() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let addr = serve(watched_app(active, peak.clone())).await;

    let mut config = fast_config();
    config.pool.max_connections_per_host = 2;
    let client = HttpClient::with_config(config).unwrap();

    let url = format!("http://{addr}/busy");
    let calls = (0..8).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move { client.get(&url).send().await }
    });
    let results = join_all(calls).await;

    for result in results {
        assert!(result.unwrap().is_success());
    }
    assert!(
        peak.load(Ordering::SeqCst) <= 2,
        "peak concurrency {} exceeded the per-host cap",
        peak.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn fail_fast_admission_rejects_when_saturated() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let addr = serve(watched_app(active, peak)).await;

    let mut config = fast_config();
    config.pool.max_in_flight = 1;
    config.pool.queue_admission = false;
    let client = HttpClient::with_config(config).unwrap();

    let url = format!("http://{addr}/busy");
    let slow_client = client.clone();
    let slow_url = url.clone();
    let first = tokio::spawn(async move { slow_client.get(&slow_url).send().await });

    // Give the first request time to occupy the only permit.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let err = client.get(&url).send().await.unwrap_err();
    assert!(err.is_concurrency_limit(), "{err:?}");

    assert!(first.await.unwrap().unwrap().is_success());
}

#[tokio::test]
async fn queued_admission_waits_instead_of_failing() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let addr = serve(watched_app(active, peak.clone())).await;

    let mut config = fast_config();
    config.pool.max_in_flight = 1;
    let client = HttpClient::with_config(config).unwrap();

    let url = format!("http://{addr}/busy");
    let calls = (0..3).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move { client.get(&url).send().await }
    });
    for result in join_all(calls).await {
        assert!(result.unwrap().is_success());
    }
    assert_eq!(peak.load(Ordering::SeqCst), 1, "requests were serialized");
}
