//! httpc — production HTTP/1.1 + HTTP/2 client
//!
//! A request-options API over a pooled, security-hardened transport:
//! composable request options (headers, bodies, cookies, auth, timeouts,
//! retries), structured results with request echo and execution metadata,
//! SSRF protection, jittered retries and resumable downloads.
//!
//! ```no_run
//! use httpc::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let client = HttpClient::new();
//! let result = client
//!     .post("https://api.example.com/items")
//!     .bearer_auth("token")
//!     .json(&serde_json::json!({ "name": "widget" }))
//!     .send()
//!     .await?;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! Configuration presets cover the common postures:
//!
//! ```no_run
//! use httpc::{HttpClient, HttpConfig};
//!
//! # fn run() -> httpc::Result<()> {
//! let hardened = HttpClient::with_config(HttpConfig::secure())?;
//! let fast = HttpClient::with_config(HttpConfig::performance())?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

mod default;
pub mod prelude;

pub use default::{close_default_client, default_client, set_default_client};

// The engine's public surface, re-exported as the crate API.
pub use httpc_client::{
    builder::RequestBuilder,
    config::{
        ConfigError, HttpConfig, PoolConfig, ProtocolConfig, ProxyConfig, RetryConfig,
        SecurityConfig, TimeoutConfig, TlsConfig, TlsVersion,
    },
    cookie::{Cookie, Jar},
    download::{DownloadOptions, DownloadResult, ProgressCallback},
    redirect,
    request::{Body, FormData},
    response::{HttpResult, RequestInfo, ResponseInfo, ResponseMeta},
    validation::ValidationError,
    CancellationToken, Error, HttpClient, Result, StatsSnapshot,
};
