//! # dialnet
//!
//! An outbound TCP dialer with Chromium-style error codes.
//!
//! `dialnet` turns a `host:port` into a ready-to-use connection:
//!
//! - **Resolution**: literal IPs short-circuit; otherwise the system resolver,
//!   then a single direct query to a configured fallback name server
//! - **Selection**: random pick among the resolved addresses from a shared,
//!   once-seeded random source
//! - **Connection**: at most two attempts, each with its own timeout
//! - **Liveness**: kernel TCP keep-alive tuned per OS, or read/write deadlines
//!   when that is not possible
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dialnet::config::DialerConfig;
//! use dialnet::socket::Dialer;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dialnet::base::neterror::NetError> {
//!     let config = DialerConfig::default()
//!         .with_resolve_timeout(Duration::from_secs(3))
//!         .with_connection_timeout(Duration::from_secs(3));
//!     let dialer = Dialer::new(config)?;
//!     let stream = dialer.dial("tcp", "example.com:80").await?;
//!     println!("connected to {:?}", stream.peer_addr());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and the dial state machine
//! - [`config`] - Dialer settings
//! - [`dns`] - Local and fallback name resolution
//! - [`socket`] - Selection, connection, keep-alive and the dialer itself
//! - [`http`] / [`client`] - HTTP/1.1 over dialed connections

pub mod base;
pub mod client;
pub mod config;
pub mod dns;
pub mod http;
pub mod socket;

pub use base::neterror::NetError;
pub use client::Client;
pub use config::DialerConfig;
pub use socket::{DialedStream, Dialer};
