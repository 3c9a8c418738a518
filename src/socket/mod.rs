//! Socket and connection management.
//!
//! Everything after name resolution:
//! - [`select`]: random address selection from a shared, seeded source
//! - [`connectjob`]: TCP connect with one retry to a secondary address
//! - [`keepalive`]: kernel keep-alive tuning with a deadline fallback
//! - [`stream`]: the dialed connection, with read/write deadlines
//! - [`dialer`]: the entry point sequencing resolve → select → connect → keep-alive

pub mod connectjob;
pub mod dialer;
pub mod keepalive;
pub mod select;
pub mod stream;

pub use dialer::{Dialer, DialerBuilder, Network};
pub use stream::DialedStream;
