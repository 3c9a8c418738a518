//! The dial entry point.
//!
//! `Dialer::dial` runs one dial from start to finish, and `Dialer::dial_until`
//! does the same under a caller deadline:
//!
//! ```text
//! Init -> Resolving -> Selecting -> Connecting -> ConfiguringKeepAlive -> Ready
//!            |                          |                 |
//!            +--------------------------+-----------------+--> Failed
//! ```
//!
//! Dials share nothing but the read-only configuration and the synchronized
//! random source, so any number may run concurrently. Dropping a dial future
//! cancels it; a socket opened by an unfinished dial is closed on drop.

pub use crate::base::dialstate::DialState;

use crate::base::neterror::NetError;
use crate::config::{limit, DialerConfig};
use crate::dns::{AddressResolver, AddressSet, GaiResolver, NameServerClient, NameServerQuery, Resolve};
use crate::socket::connectjob::{Connect, ConnectJob, TcpConnector};
use crate::socket::keepalive::{KeepAliveConfigurator, KeepAliveTuner, SystemTuner};
use crate::socket::select::{AddressSelector, SharedRng};
use crate::socket::stream::DialedStream;
use std::fmt;
use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::Instant;

/// Network kinds the dialer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Any address family.
    Tcp,
    /// IPv4 only.
    Tcp4,
    /// IPv6 only.
    Tcp6,
}

impl Network {
    fn accepts(self, ip: &IpAddr) -> bool {
        match self {
            Network::Tcp => true,
            Network::Tcp4 => ip.is_ipv4(),
            Network::Tcp6 => ip.is_ipv6(),
        }
    }
}

impl FromStr for Network {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            _ => Err(NetError::InvalidArgument("network must be tcp, tcp4 or tcp6")),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
        })
    }
}

/// Splits `host:port`, accepting `[v6]:port`. The host keeps no brackets.
pub fn split_host_port(address: &str) -> Result<(&str, u16), NetError> {
    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or(NetError::AddressInvalid)?;
        let port = tail.strip_prefix(':').ok_or(NetError::AddressInvalid)?;
        (host, port)
    } else {
        let (host, port) = address.rsplit_once(':').ok_or(NetError::AddressInvalid)?;
        // An unbracketed IPv6 literal is ambiguous.
        if host.contains(':') {
            return Err(NetError::AddressInvalid);
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(NetError::AddressInvalid);
    }
    let port = port.parse().map_err(|_| NetError::AddressInvalid)?;
    Ok((host, port))
}

/// Tracks and logs the progress of one dial.
struct Progress<'a> {
    address: &'a str,
    state: DialState,
}

impl<'a> Progress<'a> {
    fn new(address: &'a str) -> Self {
        Self {
            address,
            state: DialState::Init,
        }
    }

    fn advance(&mut self, next: DialState) {
        debug_assert!(self.state.can_advance_to(next), "{:?} -> {:?}", self.state, next);
        tracing::trace!(address = %self.address, from = ?self.state, to = ?next, "dial state");
        self.state = next;
    }

    fn fail(&mut self, error: NetError) -> NetError {
        tracing::debug!(address = %self.address, state = ?self.state, error = %error, "dial failed");
        self.advance(DialState::Failed);
        error
    }
}

/// Resolves, selects, connects and tunes keep-alive for outbound connections.
#[derive(Clone)]
pub struct Dialer {
    config: Arc<DialerConfig>,
    resolver: AddressResolver,
    connect_job: ConnectJob,
    keep_alive: KeepAliveConfigurator,
}

impl Dialer {
    /// A dialer using the system resolver, the configured fallback name
    /// server, the process-wide random source and the OS keep-alive table.
    pub fn new(config: DialerConfig) -> Result<Self, NetError> {
        DialerBuilder::new(config).build()
    }

    pub fn builder(config: DialerConfig) -> DialerBuilder {
        DialerBuilder::new(config)
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// Dial `address` (`host:port`) over `network` (`tcp`, `tcp4`, `tcp6`).
    pub async fn dial(&self, network: &str, address: &str) -> Result<DialedStream, NetError> {
        self.run(network, address, None).await
    }

    /// [`dial`](Self::dial) bounded by an overall caller deadline.
    ///
    /// Expiry while resolving fails with [`NetError::DnsTimedOut`]; expiry
    /// while connecting fails with [`NetError::ConnectionTimedOut`].
    pub async fn dial_until(
        &self,
        deadline: Instant,
        network: &str,
        address: &str,
    ) -> Result<DialedStream, NetError> {
        self.run(network, address, Some(deadline)).await
    }

    async fn run(
        &self,
        network: &str,
        address: &str,
        deadline: Option<Instant>,
    ) -> Result<DialedStream, NetError> {
        let network: Network = network.parse()?;
        let (host, port) = split_host_port(address)?;
        let mut progress = Progress::new(address);

        progress.advance(DialState::Resolving);
        let resolving = self.resolve(network, host);
        let addrs = match before(deadline, resolving, || NetError::DnsTimedOut {
            domain: host.to_string(),
        })
        .await
        {
            Ok(addrs) => addrs,
            Err(e) => return Err(progress.fail(e)),
        };

        // Selection happens inside the connect job: first pick, then the
        // secondary pick if the first attempt fails.
        progress.advance(DialState::Selecting);
        progress.advance(DialState::Connecting);
        let connecting = self.connect_job.connect(&addrs, port);
        let stream = match before(deadline, connecting, || NetError::ConnectionTimedOut).await {
            Ok(stream) => stream,
            Err(e) => return Err(progress.fail(e)),
        };

        progress.advance(DialState::ConfiguringKeepAlive);
        let stream = match self.keep_alive.configure(stream) {
            Ok(stream) => stream,
            Err(e) => return Err(progress.fail(e)),
        };

        progress.advance(DialState::Ready);
        tracing::debug!(
            address = %address,
            peer = ?stream.peer_addr().ok(),
            keep_alive = stream.keep_alive_applied(),
            "dial complete"
        );
        Ok(stream)
    }

    async fn resolve(&self, network: Network, host: &str) -> Result<AddressSet, NetError> {
        let addrs = self.resolver.resolve(host).await?;
        addrs.filter(|ip| network.accepts(ip)).ok_or_else(|| {
            NetError::dns_failed(
                host,
                io::Error::new(io::ErrorKind::NotFound, format!("no {network} address")),
            )
        })
    }
}

/// Runs `fut` to completion, or until `deadline` passes.
async fn before<T, F>(
    deadline: Option<Instant>,
    fut: F,
    expired: impl FnOnce() -> NetError,
) -> Result<T, NetError>
where
    F: Future<Output = Result<T, NetError>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| expired())?,
        None => fut.await,
    }
}

impl fmt::Debug for Dialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Swaps out the dialer's collaborators. Mostly useful for tests.
pub struct DialerBuilder {
    config: DialerConfig,
    local: Option<Arc<dyn Resolve>>,
    fallback: Option<Arc<dyn NameServerQuery>>,
    connector: Option<Arc<dyn Connect>>,
    tuner: Option<Arc<dyn KeepAliveTuner>>,
    rng: Option<SharedRng>,
}

impl DialerBuilder {
    pub fn new(config: DialerConfig) -> Self {
        Self {
            config,
            local: None,
            fallback: None,
            connector: None,
            tuner: None,
            rng: None,
        }
    }

    pub fn local_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.local = Some(resolver);
        self
    }

    pub fn name_server(mut self, query: Arc<dyn NameServerQuery>) -> Self {
        self.fallback = Some(query);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn Connect>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn keep_alive_tuner(mut self, tuner: Arc<dyn KeepAliveTuner>) -> Self {
        self.tuner = Some(tuner);
        self
    }

    pub fn rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Validates the configuration and assembles the dialer.
    pub fn build(self) -> Result<Dialer, NetError> {
        self.config.validate()?;
        let config = Arc::new(self.config);

        let local = self.local.unwrap_or_else(|| Arc::new(GaiResolver::new()));
        let fallback = match self.fallback {
            Some(fallback) => fallback,
            None => Arc::new(NameServerClient::new(
                config.name_server_addr()?,
                config.resolve_timeout,
            )),
        };
        let resolver = AddressResolver::new(local, fallback, limit(config.resolve_timeout));

        let selector = AddressSelector::with_rng(self.rng.unwrap_or_else(SharedRng::global));
        let connector = self.connector.unwrap_or_else(|| Arc::new(TcpConnector));
        let connect_job = ConnectJob::new(connector, selector, limit(config.connection_timeout));

        let tuner = self.tuner.unwrap_or_else(|| Arc::new(SystemTuner));
        let keep_alive = KeepAliveConfigurator::with_tuner(&config, tuner);

        Ok(Dialer {
            config,
            resolver,
            connect_job,
            keep_alive,
        })
    }
}
