//! Timeout configuration

use std::time::Duration;

/// Per-phase deadlines. All values are upper bounds; the engine always
/// takes the minimum of the applicable deadlines at each suspension point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Total per-attempt budget: connect + write + headers + body.
    pub request: Duration,
    /// TCP dial timeout.
    pub connect: Duration,
    /// TLS handshake timeout, applied after the TCP connect.
    pub tls_handshake: Duration,
    /// How long to wait for response headers once the request is written.
    pub response_header: Duration,
    /// TCP keep-alive probe interval for pooled connections.
    pub keep_alive: Duration,
    /// Idle pooled connections older than this are evicted.
    pub idle_connection: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
            tls_handshake: Duration::from_secs(10),
            response_header: Duration::from_secs(30),
            keep_alive: Duration::from_secs(60),
            idle_connection: Duration::from_secs(90),
        }
    }
}
