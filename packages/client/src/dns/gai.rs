//! System resolver backend (getaddrinfo)

use std::io;
use std::net::ToSocketAddrs;

use super::{Name, Resolve, Resolving};
use crate::error::BoxError;

/// Resolves through the platform's `getaddrinfo` on the blocking pool.
#[derive(Debug, Default, Clone)]
pub(crate) struct GaiResolver;

impl GaiResolver {
    pub(crate) fn new() -> GaiResolver {
        GaiResolver
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let Name { host, port } = name;
            let addrs = tokio::task::spawn_blocking(move || (host.as_str(), port).to_socket_addrs())
                .await
                .map_err(|e| Box::new(io::Error::other(e)) as BoxError)?
                .map_err(|e| Box::new(e) as BoxError)?
                .collect::<Vec<_>>();
            if addrs.is_empty() {
                return Err(Box::new(io::Error::new(
                    io::ErrorKind::NotFound,
                    "hostname resolved to no addresses",
                )) as BoxError);
            }
            Ok(addrs)
        })
    }
}
