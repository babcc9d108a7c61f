//! SSRF policy behavior with private addresses forbidden.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use httpc_client::HttpClient;
use tokio_util::sync::CancellationToken;

use support::{fast_config, serve};

fn hardened_client() -> HttpClient {
    let mut config = fast_config();
    config.security.allow_private_ips = false;
    HttpClient::with_config(config).unwrap()
}

#[tokio::test]
async fn private_literals_are_blocked_with_zero_attempts() {
    // A live local server proves no connection is ever made.
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "should never be reached"
            }
        }),
    );
    let addr = serve(app).await;
    let client = hardened_client();

    let err = client
        .get(&format!("http://{addr}/"))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_ssrf(), "{err:?}");
    assert!(!err.is_retryable());
    assert_eq!(hits.load(Ordering::SeqCst), 0, "no outbound attempt");
}

#[tokio::test]
async fn listed_ranges_are_blocked() {
    let client = hardened_client();
    for url in [
        "http://192.168.1.1/",
        "http://10.0.0.1/admin",
        "http://172.16.5.5/",
        "http://169.254.169.254/latest/meta-data/",
        "http://127.0.0.1:8080/",
        "http://[::1]/",
        "http://[fd00::1]/",
        "http://localhost/",
        "http://internal.localhost/",
    ] {
        let err = client.get(url).send().await.unwrap_err();
        assert!(err.is_ssrf(), "{url} -> {err:?}");
    }
}

#[tokio::test]
async fn public_destinations_pass_the_pre_dns_check() {
    // Allowed past SSRF validation, then cancelled before dispatch: the
    // pre-cancelled context proves the policy did not reject it.
    let client = hardened_client();
    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .get("http://example.com/")
        .context(token)
        .send()
        .await
        .unwrap_err();
    assert!(err.is_canceled(), "{err:?}");
    assert!(!err.is_ssrf());
}

#[tokio::test]
async fn default_config_allows_loopback() {
    let app = Router::new().route("/", get(|| async { "local ok" }));
    let addr = serve(app).await;
    let client = HttpClient::with_config(fast_config()).unwrap();
    let result = client.get(&format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(result.body(), "local ok");
}
