//! Retry scheduling
//!
//! Exponential backoff with a hard delay cap, `Retry-After` honoring and
//! uniform jitter from a cryptographically sourced RNG. The retryable
//! status set is restricted to responses that indicate the server did not
//! process the request; the engine nevertheless replays every HTTP
//! method, POST included, trading strict idempotency for throughput.
//! That trade-off is part of the documented contract.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::header::RETRY_AFTER;
use http::HeaderMap;
use once_cell::sync::Lazy;
use ring::rand::{SecureRandom, SystemRandom};

use crate::config::RetryConfig;

static RNG: Lazy<SystemRandom> = Lazy::new(SystemRandom::new);

/// Hard ceiling no computed delay may exceed.
const DELAY_CEILING: Duration = Duration::from_secs(30);

/// Resolved retry plan for one request.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub(crate) max_retries: u32,
    base_delay: Duration,
    backoff_factor: f64,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Combine config with the per-request override.
    pub(crate) fn new(config: &RetryConfig, max_retries_override: Option<u32>) -> RetryPolicy {
        let base_delay = config.base_delay;
        let ceiling_secs = DELAY_CEILING.as_secs_f64();
        let max_secs = (base_delay.as_secs_f64() * config.backoff_factor.max(1.0) * 3.0)
            .min(ceiling_secs);
        RetryPolicy {
            max_retries: max_retries_override.unwrap_or(config.max_retries),
            base_delay,
            backoff_factor: config.backoff_factor,
            max_delay: Duration::from_secs_f64(max_secs),
        }
    }

    /// The sleep before retry number `attempt` (zero-based): capped
    /// exponential backoff, overridden by `Retry-After` when present,
    /// plus uniform jitter in `[0, delay]`, never exceeding the cap.
    pub(crate) fn backoff_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        // Computed in float seconds and clamped before converting back,
        // so large attempt counts cannot overflow Duration arithmetic.
        let max_secs = self.max_delay.as_secs_f64();
        let exponential =
            self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt.min(16) as i32);
        let base_secs = match retry_after {
            Some(hint) => hint.as_secs_f64().min(max_secs),
            None => exponential.min(max_secs),
        };
        let base = Duration::from_secs_f64(base_secs);
        base.saturating_add(jitter(base)).min(self.max_delay)
    }
}

/// Uniform random duration in `[0, upper]`.
fn jitter(upper: Duration) -> Duration {
    if upper.is_zero() {
        return Duration::ZERO;
    }
    let mut raw = [0u8; 8];
    RNG.fill(&mut raw).expect("system rng unavailable");
    // 53 mantissa bits give a uniform fraction in [0, 1).
    let fraction = (u64::from_le_bytes(raw) >> 11) as f64 / (1u64 << 53) as f64;
    upper.mul_f64(fraction)
}

/// Parse a `Retry-After` header: delta seconds or an RFC 1123 date.
/// Dates in the past collapse to zero.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.with_timezone(&Utc) - Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32, base_ms: u64, factor: f64) -> RetryPolicy {
        RetryPolicy::new(
            &RetryConfig {
                max_retries,
                base_delay: Duration::from_millis(base_ms),
                backoff_factor: factor,
            },
            None,
        )
    }

    #[test]
    fn delay_stays_in_jitter_window() {
        let policy = policy(3, 100, 2.0);
        for attempt in 0..3u32 {
            let exponential = Duration::from_millis(100 * 2u64.pow(attempt));
            let base = exponential.min(policy.max_delay);
            let upper = base.saturating_mul(2).min(policy.max_delay);
            for _ in 0..50 {
                let delay = policy.backoff_delay(attempt, None);
                assert!(delay >= base, "{delay:?} below {base:?}");
                assert!(delay <= upper, "{delay:?} above {upper:?}");
            }
        }
    }

    #[test]
    fn delay_never_exceeds_cap() {
        let policy = policy(10, 10_000, 10.0);
        for attempt in 0..10u32 {
            assert!(policy.backoff_delay(attempt, None) <= DELAY_CEILING);
        }
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let policy = policy(2, 1000, 2.0);
        let hinted = policy.backoff_delay(0, Some(Duration::from_secs(1)));
        assert!(hinted >= Duration::from_secs(1), "{hinted:?}");
        assert!(hinted <= Duration::from_secs(2), "{hinted:?}");
        // Hints beyond the cap are clamped to it.
        let clamped = policy.backoff_delay(0, Some(Duration::from_secs(3600)));
        assert_eq!(clamped, policy.max_delay);
    }

    #[test]
    fn override_replaces_config_retries() {
        let config = RetryConfig::default();
        assert_eq!(RetryPolicy::new(&config, Some(7)).max_retries, 7);
        assert_eq!(RetryPolicy::new(&config, None).max_retries, 3);
    }

    #[test]
    fn parse_retry_after_seconds_and_date() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "120".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(120)));

        let future = Utc::now() + chrono::Duration::seconds(90);
        headers.insert(RETRY_AFTER, future.to_rfc2822().parse().unwrap());
        let parsed = parse_retry_after(&headers).unwrap();
        assert!(parsed > Duration::from_secs(80) && parsed < Duration::from_secs(100));

        let past = Utc::now() - chrono::Duration::seconds(90);
        headers.insert(RETRY_AFTER, past.to_rfc2822().parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::ZERO));

        headers.insert(RETRY_AFTER, "not-a-date".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }
}
