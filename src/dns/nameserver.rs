//! Direct queries to one configured name server.
//!
//! When the system resolver has nothing for a host, the dialer asks a
//! specific server (by default `8.8.8.8:53`) for the host's A records,
//! bypassing local configuration entirely.
//!
//! The wire protocol is hickory-dns's job. The resolver built here is pinned
//! to the single configured server, makes one attempt, never caches and never
//! consults the hosts file, so each call maps to one exchange.

use super::Name;
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{NameServerConfigGroup, ResolveHosts, ResolverConfig},
    name_server::TokioConnectionProvider,
    proto::{op::ResponseCode, ProtoErrorKind},
    ResolveError, TokioResolver,
};
use std::{
    fmt,
    future::Future,
    net::{IpAddr, SocketAddr},
    pin::Pin,
    sync::Arc,
    time::Duration,
};

/// What a name server said about a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameServerAnswer {
    /// Response code of the reply.
    pub status: ResponseCode,
    /// A records from the answer section, in received order.
    pub addrs: Vec<IpAddr>,
}

impl NameServerAnswer {
    pub fn success(addrs: Vec<IpAddr>) -> Self {
        Self {
            status: ResponseCode::NoError,
            addrs,
        }
    }

    pub fn failure(status: ResponseCode) -> Self {
        Self {
            status,
            addrs: Vec::new(),
        }
    }
}

/// Alias for the `Future` type returned by a name-server query.
pub type Querying = Pin<Box<dyn Future<Output = Result<NameServerAnswer, NetError>> + Send>>;

/// The DNS collaborator used for fallback resolution.
///
/// `Err` means the exchange itself failed (network error, malformed reply).
/// A reply with a non-success status is an `Ok` answer; judging it is up to
/// the caller.
pub trait NameServerQuery: Send + Sync {
    fn query(&self, name: Name) -> Querying;
}

impl<Q: NameServerQuery + ?Sized> NameServerQuery for Arc<Q> {
    fn query(&self, name: Name) -> Querying {
        (**self).query(name)
    }
}

/// A hickory-dns resolver talking to exactly one server over UDP
/// (with TCP fallback on truncation).
#[derive(Clone)]
pub struct NameServerClient {
    addr: SocketAddr,
    resolver: Arc<TokioResolver>,
}

impl NameServerClient {
    /// `timeout` bounds the single exchange; zero keeps hickory's default.
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        let servers = NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], servers);

        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        let opts = builder.options_mut();
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.ndots = 0;
        opts.use_hosts_file = ResolveHosts::Never;
        if !timeout.is_zero() {
            opts.timeout = timeout;
        }

        tracing::debug!(server = %addr, "fallback name server configured");

        Self {
            addr,
            resolver: Arc::new(builder.build()),
        }
    }

    /// Address of the configured server.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl NameServerQuery for NameServerClient {
    fn query(&self, name: Name) -> Querying {
        let resolver = self.resolver.clone();
        let server = self.addr;
        Box::pin(async move {
            let fqdn = name.to_fqdn();
            tracing::debug!(domain = %name, server = %server, "querying fallback name server");

            match resolver.ipv4_lookup(fqdn.as_str()).await {
                Ok(lookup) => {
                    let addrs: Vec<IpAddr> = lookup.iter().map(|a| IpAddr::V4(a.0)).collect();
                    Ok(NameServerAnswer::success(addrs))
                }
                Err(e) => match reply_code(&e) {
                    Some(ResponseCode::NoError) => Ok(NameServerAnswer::success(Vec::new())),
                    Some(code) => Ok(NameServerAnswer::failure(code)),
                    None => {
                        tracing::debug!(domain = %name, error = %e, "fallback exchange failed");
                        Err(NetError::dns_failed(
                            name.as_str(),
                            std::io::Error::other(e.to_string()),
                        ))
                    }
                },
            }
        })
    }
}

/// Response code of a reply that carried no usable records. hickory reports
/// NXDOMAIN, SERVFAIL, REFUSED and empty NOERROR answers all this way.
fn reply_code(e: &ResolveError) -> Option<ResponseCode> {
    match e.proto()?.kind() {
        ProtoErrorKind::NoRecordsFound { response_code, .. } => Some(*response_code),
        _ => None,
    }
}

impl fmt::Debug for NameServerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameServerClient")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}
