//! DNS Resolution Module
//!
//! Turns a host into a non-empty [`AddressSet`]:
//! - System resolver (getaddrinfo via thread pool)
//! - Direct query to a configured fallback name server (hickory-dns)
//! - Literal IP addresses bypass both
//!
//! # Example
//!
//! ```rust,ignore
//! use dialnet::dns::{AddressResolver, GaiResolver, NameServerClient};
//! use std::{sync::Arc, time::Duration};
//!
//! let fallback = NameServerClient::new("8.8.8.8:53".parse()?, Duration::from_secs(3));
//! let resolver = AddressResolver::new(
//!     Arc::new(GaiResolver::new()),
//!     Arc::new(fallback),
//!     Some(Duration::from_secs(3)),
//! );
//! let addrs = resolver.resolve("example.com").await?;
//! ```

mod addrset;
mod gai;
mod nameserver;
mod resolve;
mod resolver;

pub use addrset::AddressSet;
pub use gai::GaiResolver;
pub use nameserver::{NameServerAnswer, NameServerClient, NameServerQuery, Querying};
pub use resolve::{Addrs, Name, Resolve, Resolving};
pub use resolver::{literal_ip, AddressResolver};

pub use hickory_resolver::proto::op::ResponseCode;
