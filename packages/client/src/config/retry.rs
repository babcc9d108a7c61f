//! Retry configuration
//!
//! Retryable statuses (408, 429, 500, 502, 503, 504) indicate the server
//! did not process the request. The engine replays them for every HTTP
//! method, including POST and PUT; callers needing strict idempotency
//! should set `max_retries` to zero per request or in config.

use std::time::Duration;

/// Exponential backoff settings for the retry state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the initial attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; later retries scale by the factor.
    pub base_delay: Duration,
    /// Multiplicative delay growth per attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}
