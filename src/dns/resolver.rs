//! Host resolution with a direct name-server fallback.
//!
//! Order of operations for one host:
//!
//! 1. Literal IP: returned as-is, no lookup.
//! 2. Local resolver ([`GaiResolver`](super::GaiResolver) in production).
//!    A non-empty answer wins, order preserved.
//! 3. One direct A query to the fallback name server.
//!
//! The resolve timeout bounds steps 2 and 3 together. Every path that ends
//! without an address is an error; an empty success is never produced.

use super::{AddressSet, Name, NameServerAnswer, NameServerQuery, Resolve};
use crate::base::neterror::NetError;
use hickory_resolver::proto::op::ResponseCode;
use std::{io, net::IpAddr, sync::Arc, time::Duration};
use tokio::time::Instant;

/// Parses `host` as an IP literal, accepting bracketed IPv6 (`[::1]`).
pub fn literal_ip(host: &str) -> Option<IpAddr> {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse().ok()
}

/// Resolves hosts into non-empty [`AddressSet`]s.
#[derive(Clone)]
pub struct AddressResolver {
    local: Arc<dyn Resolve>,
    fallback: Arc<dyn NameServerQuery>,
    timeout: Option<Duration>,
}

impl AddressResolver {
    /// `timeout` of `None` leaves resolution unbounded.
    pub fn new(
        local: Arc<dyn Resolve>,
        fallback: Arc<dyn NameServerQuery>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            local,
            fallback,
            timeout,
        }
    }

    pub async fn resolve(&self, host: &str) -> Result<AddressSet, NetError> {
        if let Some(ip) = literal_ip(host) {
            tracing::trace!(host = %host, "literal address, skipping lookup");
            return Ok(AddressSet::single(ip));
        }

        let name = Name::new(host);
        let deadline = self.timeout.map(|t| Instant::now() + t);

        if let Some(set) = self.resolve_local(&name, deadline).await? {
            return Ok(set);
        }

        self.resolve_fallback(&name, deadline).await
    }

    /// `Ok(None)` means "try the fallback"; only an expired budget is an error.
    async fn resolve_local(
        &self,
        name: &Name,
        deadline: Option<Instant>,
    ) -> Result<Option<AddressSet>, NetError> {
        let lookup = self.local.resolve(name.clone());
        let result = match deadline {
            Some(at) => tokio::time::timeout_at(at, lookup)
                .await
                .map_err(|_| timed_out(name))?,
            None => lookup.await,
        };

        match result {
            Ok(addrs) => {
                let set = AddressSet::new(addrs.map(|a| a.ip()).collect());
                if set.is_none() {
                    tracing::debug!(domain = %name, "local resolver returned no addresses");
                }
                Ok(set)
            }
            Err(e) => {
                tracing::debug!(domain = %name, error = %e, "local resolution failed");
                Ok(None)
            }
        }
    }

    async fn resolve_fallback(
        &self,
        name: &Name,
        deadline: Option<Instant>,
    ) -> Result<AddressSet, NetError> {
        let query = self.fallback.query(name.clone());
        let answer = match deadline {
            Some(at) => tokio::time::timeout_at(at, query)
                .await
                .map_err(|_| timed_out(name))??,
            None => query.await?,
        };

        let set = into_address_set(name, answer)?;
        tracing::debug!(domain = %name, count = set.len(), "resolved via fallback name server");
        Ok(set)
    }
}

fn into_address_set(name: &Name, answer: NameServerAnswer) -> Result<AddressSet, NetError> {
    if answer.status != ResponseCode::NoError {
        tracing::debug!(domain = %name, rcode = %answer.status, "fallback name server refused");
        return Err(NetError::DnsServerFailed {
            domain: name.to_string(),
            rcode: answer.status.into(),
        });
    }

    AddressSet::new(answer.addrs).ok_or_else(|| {
        NetError::dns_failed(
            name.as_str(),
            io::Error::new(io::ErrorKind::NotFound, "no address records in answer"),
        )
    })
}

fn timed_out(name: &Name) -> NetError {
    tracing::debug!(domain = %name, "resolve timeout elapsed");
    NetError::DnsTimedOut {
        domain: name.to_string(),
    }
}
