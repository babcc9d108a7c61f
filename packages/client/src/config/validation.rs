//! Configuration range checking

use std::time::Duration;

use crate::validation::header::{validate_header_key, validate_header_value, validate_user_agent};
use crate::validation::ValidationError;

use super::HttpConfig;

const MAX_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const MAX_POOL: usize = 1000;
const MAX_IN_FLIGHT: usize = 10_000;
const MAX_BODY: u64 = 1024 * 1024 * 1024;
const MAX_RETRIES: u32 = 10;
const MAX_REDIRECTS: usize = 50;

/// A configuration field outside its accepted range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A numeric field was outside its accepted range.
    #[error("config field {field} out of range: {reason}")]
    OutOfRange {
        /// The offending field, e.g. `"retry.max_retries"`.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A static header or the user-agent failed header validation.
    #[error("config header rejected: {0}")]
    Header(#[from] ValidationError),
}

fn out_of_range(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        reason: reason.into(),
    }
}

pub(super) fn validate(cfg: &HttpConfig) -> Result<(), ConfigError> {
    if cfg.timeouts.request.is_zero() {
        return Err(out_of_range("timeouts.request", "must be positive"));
    }
    for (field, value) in [
        ("timeouts.request", cfg.timeouts.request),
        ("timeouts.connect", cfg.timeouts.connect),
        ("timeouts.tls_handshake", cfg.timeouts.tls_handshake),
        ("timeouts.response_header", cfg.timeouts.response_header),
        ("timeouts.keep_alive", cfg.timeouts.keep_alive),
        ("timeouts.idle_connection", cfg.timeouts.idle_connection),
    ] {
        if value > MAX_TIMEOUT {
            return Err(out_of_range(field, "longer than 30 minutes"));
        }
    }

    if cfg.pool.max_idle_connections > MAX_POOL {
        return Err(out_of_range("pool.max_idle_connections", "more than 1000"));
    }
    if cfg.pool.max_connections_per_host > MAX_POOL {
        return Err(out_of_range("pool.max_connections_per_host", "more than 1000"));
    }
    if cfg.pool.max_in_flight > MAX_IN_FLIGHT {
        return Err(out_of_range("pool.max_in_flight", "more than 10000"));
    }

    if cfg.tls.min_version > cfg.tls.max_version {
        return Err(out_of_range("tls.min_version", "exceeds tls.max_version"));
    }

    if cfg.security.max_response_body_size > MAX_BODY {
        return Err(out_of_range(
            "security.max_response_body_size",
            "more than 1 GiB",
        ));
    }

    if cfg.retry.max_retries > MAX_RETRIES {
        return Err(out_of_range("retry.max_retries", "more than 10"));
    }
    if cfg.retry.base_delay > MAX_TIMEOUT {
        return Err(out_of_range("retry.base_delay", "longer than 30 minutes"));
    }
    if !(1.0..=10.0).contains(&cfg.retry.backoff_factor) {
        return Err(out_of_range(
            "retry.backoff_factor",
            "must be between 1.0 and 10.0",
        ));
    }

    if cfg.protocol.max_redirects > MAX_REDIRECTS {
        return Err(out_of_range("protocol.max_redirects", "more than 50"));
    }
    validate_user_agent(&cfg.protocol.user_agent)?;
    for (key, value) in &cfg.protocol.default_headers {
        validate_header_key(key)?;
        validate_header_value(key, value)?;
    }

    Ok(())
}
