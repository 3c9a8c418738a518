//! Liveness detection for freshly dialed connections.
//!
//! The preferred mechanism is kernel TCP keep-alive with the configured idle
//! time, probe interval and probe count. If any of that cannot be applied the
//! connection gets absolute read and write deadlines instead. A connection
//! that ends up with neither is closed and the dial fails.

mod sys;

pub use sys::SystemTuner;

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::config::DialerConfig;
use crate::socket::stream::DialedStream;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// The socket options touched while enabling keep-alive, in the order they
/// are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveOption {
    /// `SO_KEEPALIVE`.
    Enable,
    /// Seconds of idleness before the first probe.
    Idle,
    /// Seconds between probes.
    Interval,
    /// Unanswered probes before the connection is dropped.
    Count,
}

/// Why keep-alive could not be tuned. Never returned from a dial.
#[derive(Debug, Error)]
pub enum KeepAliveError {
    #[error("keep-alive tuning is not supported on this platform")]
    Unsupported,
    #[error("setting {option:?} failed: {source}")]
    SetOption {
        option: KeepAliveOption,
        #[source]
        source: io::Error,
    },
}

/// Sets one keep-alive option on a socket.
///
/// The production implementation is [`SystemTuner`], which maps each
/// [`KeepAliveOption`] to the build target's socket option.
pub trait KeepAliveTuner: Send + Sync {
    fn set_option(
        &self,
        socket: &TcpStream,
        option: KeepAliveOption,
        value: u32,
    ) -> Result<(), KeepAliveError>;
}

impl<T: KeepAliveTuner + ?Sized> KeepAliveTuner for Arc<T> {
    fn set_option(
        &self,
        socket: &TcpStream,
        option: KeepAliveOption,
        value: u32,
    ) -> Result<(), KeepAliveError> {
        (**self).set_option(socket, option, value)
    }
}

/// Whole seconds, rounded up, saturating at `u32::MAX`.
fn ceil_secs(d: Duration) -> u32 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

/// Applies keep-alive or the deadline fallback to new connections.
#[derive(Clone)]
pub struct KeepAliveConfigurator {
    tuner: Arc<dyn KeepAliveTuner>,
    idle: Duration,
    interval: Duration,
    count: u32,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl KeepAliveConfigurator {
    pub fn new(config: &DialerConfig) -> Self {
        Self::with_tuner(config, Arc::new(SystemTuner))
    }

    pub fn with_tuner(config: &DialerConfig, tuner: Arc<dyn KeepAliveTuner>) -> Self {
        Self {
            tuner,
            idle: config.keep_alive_idle,
            interval: config.keep_alive_interval,
            count: config.keep_alive_count,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }

    /// Wraps `stream` and gives it a liveness mechanism.
    ///
    /// On error the stream has already been dropped (closed).
    pub fn configure(&self, stream: TcpStream) -> Result<DialedStream, NetError> {
        let mut stream = DialedStream::new(stream);

        match self.tune(stream.get_ref()) {
            Ok(()) => {
                stream.mark_keep_alive();
                tracing::debug!(
                    idle_secs = ceil_secs(self.idle),
                    interval_secs = ceil_secs(self.interval),
                    count = self.count,
                    "tcp keep-alive configured"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "tcp keep-alive unavailable, using read/write deadlines");
                self.apply_deadlines(&mut stream)?;
            }
        }

        Ok(stream)
    }

    /// Enable, idle, interval, count; stops at the first failure.
    fn tune(&self, socket: &TcpStream) -> Result<(), KeepAliveError> {
        let steps = [
            (KeepAliveOption::Enable, 1),
            (KeepAliveOption::Idle, ceil_secs(self.idle)),
            (KeepAliveOption::Interval, ceil_secs(self.interval)),
            (KeepAliveOption::Count, self.count),
        ];
        for (option, value) in steps {
            self.tuner.set_option(socket, option, value)?;
        }
        Ok(())
    }

    fn apply_deadlines(&self, stream: &mut DialedStream) -> Result<(), NetError> {
        let now = Instant::now();
        stream
            .set_read_deadline(now + self.read_timeout)
            .deadline_context("read")?;
        stream
            .set_write_deadline(now + self.write_timeout)
            .deadline_context("write")?;
        Ok(())
    }
}
