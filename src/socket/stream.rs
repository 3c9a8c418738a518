//! The connection handed back by a dial.
//!
//! `DialedStream` is a TCP stream that may carry read and write deadlines.
//! Deadlines are absolute: once one has passed, every read (or write) fails
//! with `io::ErrorKind::TimedOut` until the deadline is cleared or moved.
//! They are the liveness fallback for sockets whose keep-alive could not be
//! tuned.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::{Instant, Sleep};

/// An armed deadline. The timer is created on first poll so deadlines can be
/// set outside of a runtime context.
struct Deadline {
    at: Instant,
    timer: Option<Pin<Box<Sleep>>>,
}

impl Deadline {
    fn new(at: Instant) -> Self {
        Self { at, timer: None }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Ready once the deadline has passed; registers the waker otherwise.
    fn poll_elapsed(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let at = self.at;
        self.timer
            .get_or_insert_with(|| Box::pin(tokio::time::sleep_until(at)))
            .as_mut()
            .poll(cx)
    }
}

fn deadline_exceeded(direction: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{direction} deadline exceeded"))
}

/// A connected TCP stream owned by the caller.
pub struct DialedStream {
    inner: TcpStream,
    read_deadline: Option<Deadline>,
    write_deadline: Option<Deadline>,
    keep_alive: bool,
}

impl DialedStream {
    pub fn new(inner: TcpStream) -> Self {
        Self {
            inner,
            read_deadline: None,
            write_deadline: None,
            keep_alive: false,
        }
    }

    /// True if OS keep-alive probing was configured for this socket.
    pub fn keep_alive_applied(&self) -> bool {
        self.keep_alive
    }

    pub(crate) fn mark_keep_alive(&mut self) {
        self.keep_alive = true;
    }

    /// Fails if the socket is no longer connected or has a pending error.
    fn check_usable(&self) -> io::Result<()> {
        self.inner.peer_addr()?;
        match self.inner.take_error()? {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn set_read_deadline(&mut self, at: Instant) -> io::Result<()> {
        self.check_usable()?;
        self.read_deadline = Some(Deadline::new(at));
        Ok(())
    }

    pub fn set_write_deadline(&mut self, at: Instant) -> io::Result<()> {
        self.check_usable()?;
        self.write_deadline = Some(Deadline::new(at));
        Ok(())
    }

    pub fn clear_read_deadline(&mut self) {
        self.read_deadline = None;
    }

    pub fn clear_write_deadline(&mut self) {
        self.write_deadline = None;
    }

    pub fn read_deadline(&self) -> Option<Instant> {
        self.read_deadline.as_ref().map(|d| d.at)
    }

    pub fn write_deadline(&self) -> Option<Instant> {
        self.write_deadline.as_ref().map(|d| d.at)
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    pub fn get_ref(&self) -> &TcpStream {
        &self.inner
    }

    /// Drops any deadlines and returns the raw stream.
    pub fn into_inner(self) -> TcpStream {
        self.inner
    }
}

impl fmt::Debug for DialedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialedStream")
            .field("peer", &self.inner.peer_addr().ok())
            .field("keep_alive", &self.keep_alive)
            .field("read_deadline", &self.read_deadline())
            .field("write_deadline", &self.write_deadline())
            .finish()
    }
}

#[cfg(unix)]
impl std::os::fd::AsRawFd for DialedStream {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        std::os::fd::AsRawFd::as_raw_fd(&self.inner)
    }
}

impl AsyncRead for DialedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(deadline) = this.read_deadline.as_mut() {
            if deadline.expired() {
                return Poll::Ready(Err(deadline_exceeded("read")));
            }
        }

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(res) => Poll::Ready(res),
            Poll::Pending => match this.read_deadline.as_mut() {
                Some(deadline) => match deadline.poll_elapsed(cx) {
                    Poll::Ready(()) => Poll::Ready(Err(deadline_exceeded("read"))),
                    Poll::Pending => Poll::Pending,
                },
                None => Poll::Pending,
            },
        }
    }
}

impl AsyncWrite for DialedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if let Some(deadline) = this.write_deadline.as_mut() {
            if deadline.expired() {
                return Poll::Ready(Err(deadline_exceeded("write")));
            }
        }

        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(res) => Poll::Ready(res),
            Poll::Pending => match this.write_deadline.as_mut() {
                Some(deadline) => match deadline.poll_elapsed(cx) {
                    Poll::Ready(()) => Poll::Ready(Err(deadline_exceeded("write"))),
                    Poll::Pending => Poll::Pending,
                },
                None => Poll::Pending,
            },
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(deadline) = this.write_deadline.as_ref() {
            if deadline.expired() {
                return Poll::Ready(Err(deadline_exceeded("write")));
            }
        }
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
