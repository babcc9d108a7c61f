//! Plain-HTTP proxying through an explicit proxy URL.

mod support;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use httpc_client::{HttpClient, ProxyConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

use support::fast_config;

/// A minimal HTTP proxy that answers every absolute-form request itself
/// and records the request lines it saw.
async fn spawn_recording_proxy() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let log = log.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut filled = 0;
                loop {
                    let Ok(n) = socket.read(&mut buf[filled..]).await else {
                        return;
                    };
                    if n == 0 {
                        return;
                    }
                    filled += n;
                    if buf[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&buf[..filled]);
                if let Some(line) = head.lines().next() {
                    log.lock().unwrap().push(line.to_owned());
                }
                let body = b"via-proxy";
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.write_all(body).await;
            });
        }
    });
    (addr, seen)
}

#[tokio::test]
async fn http_requests_use_absolute_form_via_proxy() {
    let (proxy_addr, seen) = spawn_recording_proxy().await;

    let mut config = fast_config();
    config.proxy = ProxyConfig::Url(Url::parse(&format!("http://{proxy_addr}")).unwrap());
    let client = HttpClient::with_config(config).unwrap();

    // The destination does not exist; only the proxy answers.
    let result = client
        .get("http://upstream.invalid/resource?x=1")
        .send()
        .await
        .unwrap();

    assert_eq!(result.body(), "via-proxy");
    let lines = seen.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(
        lines[0].starts_with("GET http://upstream.invalid/resource?x=1"),
        "expected absolute-form request line, got {:?}",
        lines[0]
    );
}

#[tokio::test]
async fn direct_config_skips_the_proxy() {
    let (_proxy_addr, seen) = spawn_recording_proxy().await;

    let app = axum::Router::new().route("/direct", axum::routing::get(|| async { "no proxy" }));
    let addr = support::serve(app).await;

    let mut config = fast_config();
    config.proxy = ProxyConfig::Direct;
    let client = HttpClient::with_config(config).unwrap();

    let result = client
        .get(&format!("http://{addr}/direct"))
        .send()
        .await
        .unwrap();
    assert_eq!(result.body(), "no proxy");
    assert!(seen.lock().unwrap().is_empty());
}
