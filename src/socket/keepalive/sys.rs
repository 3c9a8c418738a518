//! Keep-alive tuning through `socket2`.
//!
//! Each [`KeepAliveOption`] becomes its own `setsockopt` call, so a failure
//! names the option that the kernel refused. `socket2` picks the option name
//! for the target (`TCP_KEEPIDLE` on Linux and the BSDs, `TCP_KEEPALIVE` on
//! Apple platforms). Targets without `TCP_KEEPINTVL`/`TCP_KEEPCNT` report
//! those tunables as unsupported, which sends the configurator to the
//! deadline fallback.

use super::{KeepAliveError, KeepAliveOption, KeepAliveTuner};
use socket2::{SockRef, TcpKeepalive};
use std::time::Duration;
use tokio::net::TcpStream;

/// Tunes keep-alive on the stream's socket with one option per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTuner;

impl KeepAliveTuner for SystemTuner {
    fn set_option(
        &self,
        socket: &TcpStream,
        option: KeepAliveOption,
        value: u32,
    ) -> Result<(), KeepAliveError> {
        let sock = SockRef::from(socket);
        let secs = Duration::from_secs(u64::from(value));

        let result = match option {
            KeepAliveOption::Enable => sock.set_keepalive(value != 0),
            KeepAliveOption::Idle => sock.set_tcp_keepalive(&TcpKeepalive::new().with_time(secs)),
            KeepAliveOption::Interval => {
                set_interval(&sock, secs).ok_or(KeepAliveError::Unsupported)?
            }
            KeepAliveOption::Count => set_retries(&sock, value).ok_or(KeepAliveError::Unsupported)?,
        };

        result.map_err(|source| KeepAliveError::SetOption { option, source })
    }
}

#[cfg(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "fuchsia",
    target_os = "illumos",
    target_os = "ios",
    target_os = "linux",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "windows",
))]
fn set_interval(sock: &SockRef<'_>, interval: Duration) -> Option<std::io::Result<()>> {
    Some(sock.set_tcp_keepalive(&TcpKeepalive::new().with_interval(interval)))
}

#[cfg(not(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "fuchsia",
    target_os = "illumos",
    target_os = "ios",
    target_os = "linux",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "windows",
)))]
fn set_interval(_sock: &SockRef<'_>, _interval: Duration) -> Option<std::io::Result<()>> {
    None
}

#[cfg(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "fuchsia",
    target_os = "illumos",
    target_os = "ios",
    target_os = "linux",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "windows",
))]
fn set_retries(sock: &SockRef<'_>, retries: u32) -> Option<std::io::Result<()>> {
    Some(sock.set_tcp_keepalive(&TcpKeepalive::new().with_retries(retries)))
}

#[cfg(not(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "fuchsia",
    target_os = "illumos",
    target_os = "ios",
    target_os = "linux",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "windows",
)))]
fn set_retries(_sock: &SockRef<'_>, _retries: u32) -> Option<std::io::Result<()>> {
    None
}
