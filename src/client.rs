//! HTTP client with builder pattern.
//!
//! A thin HTTP/1.1 layer over [`Dialer`]: every request dials a fresh
//! connection (resolve, select, connect, keep-alive), performs the hyper
//! handshake and reads the whole response body. A request whose dial or
//! send fails is redialed and sent once more. Plain `http://` only.
//!
//! # Example
//!
//! ```rust,ignore
//! use dialnet::client::Client;
//! use dialnet::config::DialerConfig;
//! use std::time::Duration;
//!
//! let client = Client::builder()
//!     .config(DialerConfig::default().with_connection_timeout(Duration::from_secs(3)))
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let resp = client.get("http://example.com/").send().await?;
//! println!("{} {}", resp.status(), resp.text()?);
//! ```

use crate::base::neterror::NetError;
use crate::config::DialerConfig;
use crate::http::streamfactory::HttpStreamFactory;
use crate::http::HttpResponse;
use crate::socket::dialer::Dialer;
use bytes::Bytes;
use http::header::HOST;
use http::{HeaderValue, Method, Request, Response, Uri};
use http_body_util::Full;
use hyper::body::Incoming;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PORT: u16 = 80;

/// HTTP client for making requests.
///
/// Use [`Client::builder()`] to configure and create a client.
#[derive(Debug, Clone)]
pub struct Client {
    factory: Arc<HttpStreamFactory>,
    timeout: Option<Duration>,
}

impl Client {
    /// Create a client with the given dialer settings.
    pub fn new(config: DialerConfig) -> Result<Self, NetError> {
        Self::builder().config(config).build()
    }

    /// Create a client on top of an already assembled dialer.
    pub fn with_dialer(dialer: Dialer) -> Self {
        Self {
            factory: Arc::new(HttpStreamFactory::new(dialer)),
            timeout: None,
        }
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn dialer(&self) -> &Dialer {
        self.factory.dialer()
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            headers: http::HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Dial the request's host, send it and read the full response.
    ///
    /// The request URI must be absolute (`http://host[:port]/path`). It is
    /// rewritten to origin form and a `Host` header is added if missing.
    pub async fn send(&self, req: Request<Full<Bytes>>) -> Result<HttpResponse, NetError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.execute(req))
                .await
                .map_err(|_| NetError::ConnectionTimedOut)?,
            None => self.execute(req).await,
        }
    }

    async fn execute(&self, req: Request<Full<Bytes>>) -> Result<HttpResponse, NetError> {
        let (address, req) = into_origin_form(req)?;
        tracing::debug!(method = %req.method(), address = %address, uri = %req.uri(), "sending request");

        let resp = match self.exchange(&address, req.clone()).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(address = %address, error = %e, "request failed, redialing once");
                self.exchange(&address, req).await?
            }
        };
        HttpResponse::from_hyper(resp).await
    }

    /// One dial plus one request on the fresh connection, up to the response head.
    async fn exchange(
        &self,
        address: &str,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, NetError> {
        let mut stream = self.factory.request_stream(address).await?;
        stream.send_request(req).await
    }
}

/// Split an absolute-form request into its dial address and an origin-form request.
fn into_origin_form(req: Request<Full<Bytes>>) -> Result<(String, Request<Full<Bytes>>), NetError> {
    let (mut parts, body) = req.into_parts();

    match parts.uri.scheme_str() {
        Some("http") => {}
        Some(_) => return Err(NetError::InvalidArgument("only http:// URLs are supported")),
        None => return Err(NetError::InvalidArgument("request URI must be absolute")),
    }
    let authority = parts
        .uri
        .authority()
        .cloned()
        .ok_or(NetError::InvalidArgument("request URI has no host"))?;

    let host = authority.host();
    let port = authority.port_u16().unwrap_or(DEFAULT_PORT);
    let address = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    if !parts.headers.contains_key(HOST) {
        let value = HeaderValue::from_str(authority.as_str())
            .map_err(|_| NetError::InvalidArgument("request URI has an invalid host"))?;
        parts.headers.insert(HOST, value);
    }

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    parts.uri = path
        .parse::<Uri>()
        .map_err(|_| NetError::InvalidArgument("request URI has an invalid path"))?;

    Ok((address, Request::from_parts(parts, body)))
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<DialerConfig>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Set dialer settings.
    pub fn config(mut self, config: DialerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set an overall request timeout, covering the dial and the response body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client. Fails if the dialer settings are invalid.
    pub fn build(self) -> Result<Client, NetError> {
        let dialer = Dialer::new(self.config.unwrap_or_default())?;
        Ok(Client {
            factory: Arc::new(HttpStreamFactory::new(dialer)),
            timeout: self.timeout,
        })
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    headers: http::HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    /// Add a header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.headers.insert(key, val);
        }
        self
    }

    /// Set request body.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Set JSON body.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(json) {
            self.body = Bytes::from(bytes);
            self.headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Send the request.
    pub async fn send(self) -> Result<HttpResponse, NetError> {
        let uri: Uri = self
            .url
            .parse()
            .map_err(|_| NetError::InvalidArgument("invalid URL"))?;

        let mut req = Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Full::new(self.body))
            .map_err(|_| NetError::InvalidArgument("invalid request"))?;
        req.headers_mut().extend(self.headers);

        self.client.send(req).await
    }
}
