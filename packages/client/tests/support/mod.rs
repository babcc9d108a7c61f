//! Shared helpers for integration tests: local axum servers and
//! fast-retry client configs.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use httpc_client::{HttpClient, HttpConfig};

/// Serve `app` on an ephemeral 127.0.0.1 port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    addr
}

/// Default config with millisecond-scale retries so tests stay fast.
/// Private IPs stay allowed (the default), which local servers need.
pub fn fast_config() -> HttpConfig {
    let mut config = HttpConfig::default();
    config.retry.base_delay = Duration::from_millis(1);
    config
}

pub fn fast_client() -> HttpClient {
    HttpClient::with_config(fast_config()).expect("test config is valid")
}
