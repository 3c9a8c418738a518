use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Generic Errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name {domain} not resolved: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Address invalid")]
    AddressInvalid,
    #[error("Address unreachable")]
    AddressUnreachable,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Socket not connected")]
    SocketNotConnected,

    // HTTP Errors
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Empty response")]
    EmptyResponse,

    // DNS Errors
    #[error("DNS server failed for {domain} (rcode {rcode})")]
    DnsServerFailed { domain: String, rcode: u16 },
    #[error("DNS resolution of {domain} timed out")]
    DnsTimedOut { domain: String },

    // Custom errors (codes starting at -10000)
    #[error("Failed to set {direction} deadline: {source}")]
    DeadlineNotSet {
        direction: &'static str,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Builds a [`NetError::ConnectionFailedTo`] carrying the underlying IO error.
    pub fn connection_failed_to(host: &str, port: u16, source: io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            source: Arc::new(source),
        }
    }

    /// Builds a [`NetError::NameNotResolvedFor`] carrying the underlying IO error.
    pub fn dns_failed(domain: &str, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    pub fn deadline_not_set(direction: &'static str, source: io::Error) -> Self {
        NetError::DeadlineNotSet {
            direction,
            source: Arc::new(source),
        }
    }

    /// True for every error that means "no usable address for this host".
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved
                | NetError::NameNotResolvedFor { .. }
                | NetError::DnsServerFailed { .. }
                | NetError::DnsTimedOut { .. }
        )
    }

    /// True when every connection attempt for a resolved host failed.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            NetError::ConnectionFailedTo { .. }
                | NetError::ConnectionFailed
                | NetError::ConnectionRefused
                | NetError::ConnectionReset
                | NetError::ConnectionAborted
                | NetError::ConnectionTimedOut
                | NetError::AddressUnreachable
        )
    }

    /// True when a connection was closed because it had no liveness detection.
    pub fn is_deadline_error(&self) -> bool {
        matches!(self, NetError::DeadlineNotSet { .. })
    }

    /// The underlying IO error kind, if this error carries one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            NetError::ConnectionFailedTo { source, .. }
            | NetError::NameNotResolvedFor { source, .. }
            | NetError::DeadlineNotSet { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::InvalidArgument(_) => -4,
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed => -104,
            NetError::ConnectionFailedTo { source, .. } => match source.kind() {
                io::ErrorKind::ConnectionRefused => -102,
                io::ErrorKind::ConnectionReset => -101,
                io::ErrorKind::ConnectionAborted => -103,
                io::ErrorKind::TimedOut => -118,
                _ => -104,
            },
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::AddressInvalid => -108,
            NetError::AddressUnreachable => -109,
            NetError::SocketNotConnected => -112,
            NetError::ConnectionTimedOut => -118,
            NetError::InvalidResponse => -320,
            NetError::EmptyResponse => -324,
            NetError::DnsServerFailed { .. } => -802,
            NetError::DnsTimedOut { .. } => -803,
            NetError::DeadlineNotSet { .. } => -10000,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -108 => NetError::AddressInvalid,
            -109 => NetError::AddressUnreachable,
            -112 => NetError::SocketNotConnected,
            -118 => NetError::ConnectionTimedOut,
            -320 => NetError::InvalidResponse,
            -324 => NetError::EmptyResponse,
            _ => NetError::Unknown(code),
        }
    }
}
