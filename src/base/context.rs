//! Error context helpers.
//!
//! Turns bare `io::Error`s from resolvers and sockets into `NetError`
//! variants that remember which domain or deadline they belong to.

use crate::base::neterror::NetError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Attach the looked-up domain to a resolver error.
    ///
    /// ```ignore
    /// use dialnet::base::context::IoResultExt;
    ///
    /// let addrs = ("example.com", 0).to_socket_addrs().dns_context("example.com")?;
    /// // Error: "Name example.com not resolved: failed to lookup address information"
    /// ```
    fn dns_context(self, domain: &str) -> Result<T, NetError>;

    /// Mark a failure to arm a read or write deadline.
    fn deadline_context(self, direction: &'static str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }

    fn deadline_context(self, direction: &'static str) -> Result<T, NetError> {
        self.map_err(|e| NetError::deadline_not_set(direction, e))
    }
}
