//! In-flight admission control
//!
//! Two layers of permits: a client-wide gate bounding total in-flight
//! requests (held for the whole retry loop) and a per-origin gate
//! bounding simultaneous connections to one host. Per-origin permits are
//! held until the response body is consumed, so the cap is observable at
//! the socket level.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::PoolConfig;
use crate::error::{self, Error};

/// A connection pool key: scheme, host, port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

pub(crate) fn origin_of(url: &Url) -> Origin {
    Origin {
        scheme: url.scheme().to_owned(),
        host: url.host_str().unwrap_or_default().to_ascii_lowercase(),
        port: url.port_or_known_default().unwrap_or(0),
    }
}

/// Permit issuer for both admission layers.
#[derive(Debug)]
pub(crate) struct Admission {
    global: Option<Arc<Semaphore>>,
    queue: bool,
    per_host: DashMap<Origin, Arc<Semaphore>>,
    per_host_cap: usize,
}

impl Admission {
    pub(crate) fn new(pool: &PoolConfig) -> Admission {
        Admission {
            global: (pool.max_in_flight > 0)
                .then(|| Arc::new(Semaphore::new(pool.max_in_flight))),
            queue: pool.queue_admission,
            per_host: DashMap::new(),
            per_host_cap: pool.max_connections_per_host,
        }
    }

    /// One client-wide permit, held across the whole retry loop.
    pub(crate) async fn acquire_global(
        &self,
        ctx: Option<&CancellationToken>,
    ) -> Result<Option<OwnedSemaphorePermit>, Error> {
        let Some(semaphore) = &self.global else {
            return Ok(None);
        };
        if !self.queue {
            return semaphore
                .clone()
                .try_acquire_owned()
                .map(Some)
                .map_err(|_| error::concurrency_limit());
        }
        acquire(Arc::clone(semaphore), ctx).await.map(Some)
    }

    /// One per-origin permit, held until the hop's body is consumed.
    pub(crate) async fn acquire_host(
        &self,
        origin: Origin,
        ctx: Option<&CancellationToken>,
    ) -> Result<Option<OwnedSemaphorePermit>, Error> {
        if self.per_host_cap == 0 {
            return Ok(None);
        }
        let semaphore = self
            .per_host
            .entry(origin)
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_cap)))
            .clone();
        acquire(semaphore, ctx).await.map(Some)
    }
}

async fn acquire(
    semaphore: Arc<Semaphore>,
    ctx: Option<&CancellationToken>,
) -> Result<OwnedSemaphorePermit, Error> {
    match ctx {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(error::canceled()),
            permit = semaphore.acquire_owned() => {
                permit.map_err(|_| error::canceled())
            }
        },
        None => semaphore
            .acquire_owned()
            .await
            .map_err(|_| error::canceled()),
    }
}
