//! System DNS resolver using getaddrinfo.
//!
//! Runs `getaddrinfo` on tokio's blocking pool so the async runtime is never
//! stalled. This is the "local resolver" step of every dial; it respects
//! `/etc/hosts`, `/etc/resolv.conf` and whatever else the OS is configured
//! with.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::net::{SocketAddr, ToSocketAddrs};

/// System DNS resolver using `getaddrinfo` in a thread pool.
///
/// A blocking lookup cannot be interrupted once started. When the dial
/// future is dropped or times out, the caller stops waiting and the
/// thread finishes on its own; its result is discarded.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.as_str().to_string();
            let domain = host.clone();

            let result = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<SocketAddr>>())
            })
            .await;

            let addrs = result
                .map_err(|e| {
                    tracing::error!(error = %e, "getaddrinfo task failed");
                    NetError::NameNotResolved
                })?
                .dns_context(&domain)?;

            tracing::debug!(domain = %domain, count = addrs.len(), "getaddrinfo complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
