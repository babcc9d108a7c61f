//! DNS resolution
//!
//! A small [`Resolve`] abstraction so the connector can swap backends and
//! layer policy. [`GuardedResolver`] wraps any backend with the post-DNS
//! SSRF check: when private addresses are forbidden, every resolved
//! address is validated against the blocklist before a connect is
//! attempted, which is what defeats public names CNAMEd at internal
//! ranges.

pub(crate) mod gai;

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{BoxError, SsrfViolation};
use crate::validation::ip::is_blocked_ip;

/// A hostname queued for resolution, paired with the destination port so
/// backends can emit ready-to-dial socket addresses.
#[derive(Debug, Clone)]
pub(crate) struct Name {
    pub(crate) host: String,
    pub(crate) port: u16,
}

pub(crate) type Resolving =
    Pin<Box<dyn Future<Output = Result<Vec<SocketAddr>, BoxError>> + Send>>;

/// A DNS backend.
pub(crate) trait Resolve: Send + Sync {
    fn resolve(&self, name: Name) -> Resolving;
}

/// Type-erased shared resolver handle.
#[derive(Clone)]
pub(crate) struct DynResolver(Arc<dyn Resolve>);

impl DynResolver {
    pub(crate) fn new(resolver: Arc<dyn Resolve>) -> DynResolver {
        DynResolver(resolver)
    }

    pub(crate) fn gai() -> DynResolver {
        DynResolver(Arc::new(gai::GaiResolver::new()))
    }

    pub(crate) fn resolve(&self, name: Name) -> Resolving {
        self.0.resolve(name)
    }
}

impl fmt::Debug for DynResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynResolver")
    }
}

/// A resolver layering the private-range rejection over a backend.
#[derive(Clone)]
pub(crate) struct GuardedResolver {
    inner: DynResolver,
    block_private: bool,
}

impl GuardedResolver {
    pub(crate) fn new(inner: DynResolver, block_private: bool) -> GuardedResolver {
        GuardedResolver {
            inner,
            block_private,
        }
    }

    /// Resolve and, when the policy demands it, reject the whole lookup if
    /// any resolved address is in a blocked range.
    pub(crate) fn resolve(&self, name: Name) -> Resolving {
        let fut = self.inner.resolve(name);
        let block_private = self.block_private;
        Box::pin(async move {
            let addrs = fut.await?;
            if block_private {
                if let Some(bad) = addrs.iter().find(|addr| is_blocked_ip(addr.ip())) {
                    let violation = SsrfViolation { addr: bad.ip() };
                    return Err(Box::new(io::Error::other(violation)) as BoxError);
                }
            }
            Ok(addrs)
        })
    }
}
