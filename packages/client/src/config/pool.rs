//! Connection pool and admission configuration

/// Connection pool sizing plus the in-flight admission gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on idle connections kept across all origins.
    pub max_idle_connections: usize,
    /// Upper bound on connections to a single `(scheme, host, port)` origin.
    pub max_connections_per_host: usize,
    /// Total in-flight requests admitted per client. `0` disables the gate.
    pub max_in_flight: usize,
    /// When `true` (default), admission waits for a permit. When `false`,
    /// a saturated client fails fast with a concurrency-limit error.
    pub queue_admission: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 50,
            max_connections_per_host: 10,
            max_in_flight: 100,
            queue_admission: true,
        }
    }
}
