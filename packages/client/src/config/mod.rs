//! Client configuration
//!
//! [`HttpConfig`] is assembled once, validated, and cloned into the client
//! at construction. Mutating the original afterwards has no effect on a
//! running client. Presets start from [`HttpConfig::default`] and override
//! specific fields; see each constructor for the intent.

mod network;
mod pool;
mod protocol;
mod retry;
mod security;
mod timeouts;
mod tls;
mod validation;

use std::time::Duration;

pub use network::ProxyConfig;
pub use pool::PoolConfig;
pub use protocol::ProtocolConfig;
pub use retry::RetryConfig;
pub use security::SecurityConfig;
pub use timeouts::TimeoutConfig;
pub use tls::{TlsConfig, TlsVersion};
pub use validation::ConfigError;

/// Immutable client settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpConfig {
    /// Per-phase deadlines.
    pub timeouts: TimeoutConfig,
    /// Pool sizing and in-flight admission.
    pub pool: PoolConfig,
    /// TLS negotiation.
    pub tls: TlsConfig,
    /// Response and destination hardening.
    pub security: SecurityConfig,
    /// Retry state machine settings.
    pub retry: RetryConfig,
    /// Identification, redirects, HTTP/2 and cookies.
    pub protocol: ProtocolConfig,
    /// Outbound routing.
    pub proxy: ProxyConfig,
}

impl HttpConfig {
    /// Balanced settings for trusted destinations. 30 s timeout, pooled
    /// connections, 3 retries, redirects followed, HTTP/2 on, cookies off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hardened settings for caller-supplied URLs: private addresses
    /// forbidden, redirects disabled, tighter timeouts and body cap,
    /// a single conservative retry.
    #[must_use]
    pub fn secure() -> Self {
        let mut cfg = Self::default();
        cfg.timeouts.request = Duration::from_secs(15);
        cfg.pool.max_idle_connections = 20;
        cfg.pool.max_connections_per_host = 5;
        cfg.security.max_response_body_size = 5 * 1024 * 1024;
        cfg.security.allow_private_ips = false;
        cfg.retry.max_retries = 1;
        cfg.retry.base_delay = Duration::from_secs(2);
        cfg.protocol.follow_redirects = false;
        cfg.protocol.enable_cookies = false;
        cfg
    }

    /// Throughput-oriented settings: generous pool and body cap, fast
    /// retry cycle, relaxed content-length checking, cookies on.
    #[must_use]
    pub fn performance() -> Self {
        let mut cfg = Self::default();
        cfg.timeouts.request = Duration::from_secs(60);
        cfg.pool.max_idle_connections = 100;
        cfg.pool.max_connections_per_host = 20;
        cfg.security.max_response_body_size = 50 * 1024 * 1024;
        cfg.security.strict_content_length = false;
        cfg.retry.base_delay = Duration::from_millis(500);
        cfg.retry.backoff_factor = 1.5;
        cfg.protocol.enable_cookies = true;
        cfg
    }

    /// Smallest footprint: tiny pool, 1 MiB body cap, no retries, no
    /// redirects.
    #[must_use]
    pub fn minimal() -> Self {
        let mut cfg = Self::default();
        cfg.pool.max_idle_connections = 10;
        cfg.pool.max_connections_per_host = 2;
        cfg.security.max_response_body_size = 1024 * 1024;
        cfg.retry.max_retries = 0;
        cfg.protocol.follow_redirects = false;
        cfg.protocol.enable_cookies = false;
        cfg
    }

    /// Settings for test suites only: certificate verification off,
    /// private addresses allowed, HTTP/2 off for deterministic HTTP/1.1
    /// framing, cookies on. Never use in production.
    #[must_use]
    pub fn testing() -> Self {
        let mut cfg = Self::default();
        cfg.tls.danger_skip_verify = true;
        cfg.security.allow_private_ips = true;
        cfg.protocol.enable_http2 = false;
        cfg.protocol.enable_cookies = true;
        cfg
    }

    /// Check every numeric range and validate the static headers and
    /// user-agent through the header validators.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)
    }
}
