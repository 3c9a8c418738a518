//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): Network error codes matching `net_error_list.h`
//! - [`DialState`](dialstate::DialState): Progress of one dial

pub mod context;
pub mod dialstate;
pub mod neterror;

#[cfg(test)]
mod tests;
