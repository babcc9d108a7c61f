//! Client counters
//!
//! Lock-free telemetry updated from the engine's hot path: plain atomic
//! adds with relaxed ordering, read out as a consistent-enough snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal counters, one set per client.
#[derive(Debug, Default)]
pub(crate) struct ClientStats {
    total_requests: AtomicU64,
    retries: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    bytes_received: AtomicU64,
}

impl ClientStats {
    pub(crate) fn new() -> ClientStats {
        ClientStats::default()
    }

    #[inline]
    pub(crate) fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a client's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests started, including those that later failed.
    pub total_requests: u64,
    /// Retry attempts scheduled by the engine.
    pub retries: u64,
    /// Requests that returned a result.
    pub successes: u64,
    /// Requests that surfaced an error.
    pub failures: u64,
    /// Response body bytes received (wire size, pre-decompression).
    pub bytes_received: u64,
}
