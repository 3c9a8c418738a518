//! Dialer configuration.
//!
//! A [`DialerConfig`] is built once, validated, and then shared read-only
//! (behind an `Arc`) by every dial. Defaults: one-second keep-alive
//! idle/interval, three probes, sixty-second read/write deadlines and
//! Google's public resolver as the fallback.

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Default fallback name server.
pub const DEFAULT_NAME_SERVER: &str = "8.8.8.8:53";

/// Settings consumed by [`Dialer`](crate::socket::dialer::Dialer).
///
/// A zero `resolve_timeout` or `connection_timeout` means "no limit".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialerConfig {
    /// Budget for the whole resolution step (local lookup plus fallback query).
    pub resolve_timeout: Duration,
    /// Not used by the dialer; carried for transports that negotiate TLS.
    pub tls_handshake_timeout: Duration,
    /// Budget for each individual connection attempt.
    pub connection_timeout: Duration,
    /// Idle time before the first keep-alive probe.
    pub keep_alive_idle: Duration,
    /// Interval between keep-alive probes.
    pub keep_alive_interval: Duration,
    /// Unanswered probes before the peer is declared unreachable.
    pub keep_alive_count: u32,
    /// Read deadline applied when keep-alive cannot be tuned.
    pub read_timeout: Duration,
    /// Write deadline applied when keep-alive cannot be tuned.
    pub write_timeout: Duration,
    /// `ip:port` of the name server queried when local resolution fails.
    pub name_server: String,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            resolve_timeout: Duration::ZERO,
            tls_handshake_timeout: Duration::ZERO,
            connection_timeout: Duration::ZERO,
            keep_alive_idle: Duration::from_secs(1),
            keep_alive_interval: Duration::from_secs(1),
            keep_alive_count: 3,
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(60),
            name_server: DEFAULT_NAME_SERVER.to_string(),
        }
    }
}

impl DialerConfig {
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn with_tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.tls_handshake_timeout = timeout;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set idle time, probe interval and probe count in one go.
    pub fn with_keep_alive(mut self, idle: Duration, interval: Duration, count: u32) -> Self {
        self.keep_alive_idle = idle;
        self.keep_alive_interval = interval;
        self.keep_alive_count = count;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_name_server(mut self, addr: impl Into<String>) -> Self {
        self.name_server = addr.into();
        self
    }

    /// Parsed fallback name server address.
    pub fn name_server_addr(&self) -> Result<SocketAddr, NetError> {
        self.name_server
            .parse()
            .map_err(|_| NetError::InvalidArgument("name_server must be an ip:port address"))
    }

    /// Checks the invariants every dial relies on.
    pub fn validate(&self) -> Result<(), NetError> {
        self.name_server_addr()?;

        if self.read_timeout.is_zero() {
            return Err(NetError::InvalidArgument("read_timeout must be non-zero"));
        }
        if self.write_timeout.is_zero() {
            return Err(NetError::InvalidArgument("write_timeout must be non-zero"));
        }

        let max = Duration::from_secs(i32::MAX as u64);
        if self.keep_alive_idle > max || self.keep_alive_interval > max {
            return Err(NetError::InvalidArgument(
                "keep-alive durations must fit in a C int of seconds",
            ));
        }
        if self.keep_alive_count > i32::MAX as u32 {
            return Err(NetError::InvalidArgument("keep_alive_count is too large"));
        }

        Ok(())
    }
}

/// `None` for a zero duration, which callers treat as "no limit".
pub(crate) fn limit(d: Duration) -> Option<Duration> {
    (!d.is_zero()).then_some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DialerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.keep_alive_count, 3);
        assert_eq!(config.name_server, "8.8.8.8:53");
    }

    #[test]
    fn test_builder_methods() {
        let config = DialerConfig::default()
            .with_connection_timeout(Duration::from_secs(3))
            .with_keep_alive(Duration::from_secs(3), Duration::from_secs(3), 3)
            .with_name_server("1.1.1.1:53");

        assert_eq!(config.connection_timeout, Duration::from_secs(3));
        assert_eq!(config.keep_alive_idle, Duration::from_secs(3));
        assert_eq!(config.name_server_addr().unwrap(), "1.1.1.1:53".parse().unwrap());
    }

    #[test]
    fn test_name_server_without_port_rejected() {
        let config = DialerConfig::default().with_name_server("8.8.8.8");
        assert!(matches!(config.validate(), Err(NetError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_deadlines_rejected() {
        let config = DialerConfig::default().with_read_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = DialerConfig::default().with_write_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_limit_treats_zero_as_unbounded() {
        assert_eq!(limit(Duration::ZERO), None);
        assert_eq!(limit(Duration::from_millis(5)), Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: DialerConfig =
            serde_json::from_str(r#"{"name_server":"9.9.9.9:53","keep_alive_count":5}"#).unwrap();
        assert_eq!(config.name_server, "9.9.9.9:53");
        assert_eq!(config.keep_alive_count, 5);
        assert_eq!(config.read_timeout, Duration::from_secs(60));
    }
}
