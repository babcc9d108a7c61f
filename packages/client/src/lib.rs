//! httpc_client — HTTP/1.1 + HTTP/2 request execution engine
//!
//! The engine behind the `httpc` facade: validated request construction,
//! a pooled hyper transport with TLS, proxy and cookie support, SSRF
//! protection before and after DNS, a retry state machine with jittered
//! backoff, transparent gzip/deflate decoding, size-bounded capture and
//! resumable file downloads.
//!
//! Most callers want the `httpc` crate; use this one directly when
//! constructing clients with explicit configuration:
//!
//! ```no_run
//! use httpc_client::{HttpClient, HttpConfig};
//!
//! # async fn run() -> Result<(), httpc_client::Error> {
//! let client = HttpClient::with_config(HttpConfig::secure())?;
//! let result = client.get("https://example.com/api").send().await?;
//! println!("{} {}", result.status_code(), result.body().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Retry semantics
//!
//! Statuses 408, 429, 500, 502, 503 and 504 plus transport failures are
//! retried with capped exponential backoff and jitter, honoring
//! `Retry-After`. Retries replay every HTTP method, POST included; the
//! retryable status set only contains responses where the server did not
//! process the request, but callers needing strict idempotency should
//! disable retries per request.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod builder;
pub mod client;
pub mod config;
pub mod cookie;
pub mod download;
pub mod redirect;
pub mod request;
pub mod response;
pub mod validation;

mod connect;
mod dns;
mod error;
mod execute;
mod proxy;
mod retry;

pub use builder::RequestBuilder;
pub use client::{HttpClient, StatsSnapshot};
pub use config::{
    ConfigError, HttpConfig, PoolConfig, ProtocolConfig, ProxyConfig, RetryConfig,
    SecurityConfig, TimeoutConfig, TlsConfig, TlsVersion,
};
pub use cookie::{Cookie, Jar};
pub use download::{DownloadOptions, DownloadResult, ProgressCallback};
pub use error::{Error, Result};
pub use request::{Body, FormData};
pub use response::{HttpResult, RequestInfo, ResponseInfo, ResponseMeta};
pub use validation::ValidationError;

// Cancellation context type callers pass to `RequestBuilder::context`.
pub use tokio_util::sync::CancellationToken;
