use crate::base::neterror::NetError;
use crate::socket::dialer::Dialer;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::spawn;

/// An HTTP/1.1 connection over a dialed stream.
/// Equivalent to net::HttpStream.
pub struct HttpStream {
    sender: http1::SendRequest<Full<Bytes>>,
}

impl HttpStream {
    pub async fn send_request(
        &mut self,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, NetError> {
        self.sender.ready().await.map_err(|e| {
            tracing::debug!(error = %e, "connection not ready");
            NetError::ConnectionClosed
        })?;
        self.sender.send_request(req).await.map_err(|e| {
            tracing::debug!(error = %e, "request failed");
            NetError::ConnectionClosed
        })
    }
}

/// Opens [`HttpStream`]s through a [`Dialer`].
#[derive(Debug, Clone)]
pub struct HttpStreamFactory {
    dialer: Dialer,
}

impl HttpStreamFactory {
    pub fn new(dialer: Dialer) -> Self {
        Self { dialer }
    }

    pub fn dialer(&self) -> &Dialer {
        &self.dialer
    }

    /// Dial `address` (`host:port`) and run the HTTP/1.1 handshake on it.
    pub async fn request_stream(&self, address: &str) -> Result<HttpStream, NetError> {
        // 1. Dial: resolve, connect, keep-alive
        let stream = self.dialer.dial("tcp", address).await?;

        // 2. Handshake
        let io = TokioIo::new(stream);
        let (sender, conn) = http1::handshake(io).await.map_err(|e| {
            tracing::debug!(address = %address, error = %e, "http1 handshake failed");
            NetError::ConnectionFailed
        })?;

        // 3. Spawn the connection driver
        let address = address.to_string();
        spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(address = %address, error = %e, "connection closed with error");
            }
        });

        Ok(HttpStream { sender })
    }
}
