//! Bounded-retry TCP connection establishment.
//!
//! At most two attempts per dial: one to a randomly selected address and, if
//! that fails and the host has more than one address, one more to a
//! secondary pick. Each attempt gets its own connection-timeout budget.
//! Anything beyond that is the caller's business.

use crate::base::neterror::NetError;
use crate::dns::AddressSet;
use crate::socket::select::AddressSelector;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Hard cap on connection attempts per dial.
pub const MAX_ATTEMPTS: usize = 2;

/// Alias for the `Future` type returned by a [`Connect`] implementation.
pub type Connecting = Pin<Box<dyn Future<Output = io::Result<TcpStream>> + Send>>;

/// Opens one TCP connection.
pub trait Connect: Send + Sync {
    fn connect(&self, addr: SocketAddr) -> Connecting;
}

impl<C: Connect + ?Sized> Connect for Arc<C> {
    fn connect(&self, addr: SocketAddr) -> Connecting {
        (**self).connect(addr)
    }
}

/// Plain `TcpStream::connect`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connect for TcpConnector {
    fn connect(&self, addr: SocketAddr) -> Connecting {
        Box::pin(TcpStream::connect(addr))
    }
}

/// One finished attempt.
#[derive(Debug)]
pub struct DialAttempt {
    pub addr: SocketAddr,
    pub error: io::Error,
}

/// Manages the connection step of a dial: select, connect, maybe retry once.
#[derive(Clone)]
pub struct ConnectJob {
    connector: Arc<dyn Connect>,
    selector: AddressSelector,
    timeout: Option<Duration>,
}

impl ConnectJob {
    /// `timeout` of `None` leaves each attempt unbounded.
    pub fn new(
        connector: Arc<dyn Connect>,
        selector: AddressSelector,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            connector,
            selector,
            timeout,
        }
    }

    /// Connects to one of `addrs` on `port`.
    ///
    /// On failure the error of the last attempt is returned, tagged with the
    /// address it was made to.
    pub async fn connect(&self, addrs: &AddressSet, port: u16) -> Result<TcpStream, NetError> {
        let first = self.selector.select(addrs);
        let attempt = self.attempt(first, port).await;
        let attempt = match attempt {
            Ok(stream) => return Ok(stream),
            Err(attempt) if addrs.len() == 1 => return Err(into_error(attempt)),
            Err(attempt) => attempt,
        };

        tracing::debug!(
            addr = %attempt.addr,
            error = %attempt.error,
            "first connection attempt failed, retrying"
        );

        let second = self.selector.select_secondary(addrs, first);
        self.attempt(second, port).await.map_err(into_error)
    }

    async fn attempt(&self, ip: IpAddr, port: u16) -> Result<TcpStream, DialAttempt> {
        let addr = SocketAddr::new(ip, port);
        tracing::trace!(addr = %addr, "connecting");

        let connecting = self.connector.connect(addr);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, connecting).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
            },
            None => connecting.await,
        };

        result.map_err(|error| DialAttempt { addr, error })
    }
}

fn into_error(attempt: DialAttempt) -> NetError {
    tracing::debug!(addr = %attempt.addr, error = %attempt.error, "connection failed");
    NetError::connection_failed_to(
        &attempt.addr.ip().to_string(),
        attempt.addr.port(),
        attempt.error,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::select::SharedRng;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    /// Connects every "good" address to a local listener and refuses the rest.
    struct RoutedConnector {
        target: SocketAddr,
        refuse: Vec<IpAddr>,
        attempts: Mutex<Vec<SocketAddr>>,
    }

    impl Connect for RoutedConnector {
        fn connect(&self, addr: SocketAddr) -> Connecting {
            self.attempts.lock().unwrap().push(addr);
            let refused = self.refuse.contains(&addr.ip());
            let target = self.target;
            Box::pin(async move {
                if refused {
                    Err(io::Error::from(io::ErrorKind::ConnectionRefused))
                } else {
                    TcpStream::connect(target).await
                }
            })
        }
    }

    fn ip(d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, d))
    }

    async fn routed(refuse: Vec<IpAddr>) -> (Arc<RoutedConnector>, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let connector = Arc::new(RoutedConnector {
            target: listener.local_addr().unwrap(),
            refuse,
            attempts: Mutex::new(Vec::new()),
        });
        (connector, listener)
    }

    fn job(connector: Arc<RoutedConnector>, seed: u64) -> ConnectJob {
        ConnectJob::new(
            connector,
            AddressSelector::with_rng(SharedRng::seeded(seed)),
            Some(Duration::from_secs(3)),
        )
    }

    #[tokio::test]
    async fn test_single_address_single_attempt_on_failure() {
        let (connector, _listener) = routed(vec![ip(1)]).await;
        let set = AddressSet::single(ip(1));

        let err = job(connector.clone(), 1).connect(&set, 80).await.unwrap_err();

        assert_eq!(connector.attempts.lock().unwrap().len(), 1);
        match err {
            NetError::ConnectionFailedTo { host, port, source } => {
                assert_eq!(host, "10.0.0.1");
                assert_eq!(port, 80);
                assert_eq!(source.kind(), io::ErrorKind::ConnectionRefused);
            }
            other => panic!("Expected ConnectionFailedTo, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_makes_no_retry() {
        let (connector, _listener) = routed(vec![]).await;
        let set = AddressSet::new(vec![ip(1), ip(2)]).unwrap();

        job(connector.clone(), 2).connect(&set, 80).await.unwrap();

        assert_eq!(connector.attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_both_attempts_fail_returns_last_error() {
        let (connector, _listener) = routed(vec![ip(1), ip(2), ip(3)]).await;
        let set = AddressSet::new(vec![ip(1), ip(2), ip(3)]).unwrap();

        let err = job(connector.clone(), 3).connect(&set, 443).await.unwrap_err();

        let attempts = connector.attempts.lock().unwrap();
        assert_eq!(attempts.len(), MAX_ATTEMPTS);
        match err {
            NetError::ConnectionFailedTo { host, .. } => {
                assert_eq!(host, attempts[1].ip().to_string());
            }
            other => panic!("Expected ConnectionFailedTo, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retry_uses_same_port() {
        let (connector, _listener) = routed(vec![ip(1), ip(2)]).await;
        let set = AddressSet::new(vec![ip(1), ip(2)]).unwrap();

        let _ = job(connector.clone(), 4).connect(&set, 8080).await;

        let attempts = connector.attempts.lock().unwrap();
        assert!(attempts.iter().all(|a| a.port() == 8080));
        assert!(attempts.iter().all(|a| set.contains(&a.ip())));
    }

    struct HangingConnector {
        attempts: Mutex<usize>,
    }

    impl Connect for HangingConnector {
        fn connect(&self, _addr: SocketAddr) -> Connecting {
            *self.attempts.lock().unwrap() += 1;
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_gets_its_own_budget() {
        let connector = Arc::new(HangingConnector {
            attempts: Mutex::new(0),
        });
        let job = ConnectJob::new(
            connector.clone(),
            AddressSelector::with_rng(SharedRng::seeded(5)),
            Some(Duration::from_secs(3)),
        );
        let set = AddressSet::new(vec![ip(1), ip(2)]).unwrap();

        let start = tokio::time::Instant::now();
        let err = job.connect(&set, 80).await.unwrap_err();

        assert_eq!(*connector.attempts.lock().unwrap(), 2);
        assert_eq!(err.io_kind(), Some(io::ErrorKind::TimedOut));
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }
}
