//! Tests for Client API.

use bytes::Bytes;
use dialnet::base::neterror::NetError;
use dialnet::client::Client;
use dialnet::config::DialerConfig;
use http::{Request, StatusCode};
use http_body_util::Full;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serves one request with `body`, and hands back the raw request head.
async fn serve_once(body: &'static str) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (addr, rx)
}

fn config() -> DialerConfig {
    DialerConfig::default()
        .with_connection_timeout(Duration::from_secs(3))
        .with_keep_alive(Duration::from_secs(3), Duration::from_secs(3), 3)
}

// === Client Tests ===

#[test]
fn test_client_creation() {
    let _client = Client::new(DialerConfig::default()).unwrap();
}

#[test]
fn test_client_builder() {
    let _client = Client::builder()
        .config(config())
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap();
}

#[test]
fn test_client_rejects_invalid_config() {
    let err = Client::new(DialerConfig::default().with_read_timeout(Duration::ZERO)).unwrap_err();
    assert!(matches!(err, NetError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_send_get_over_dialer() {
    let (addr, head) = serve_once("hello").await;
    let client = Client::new(config()).unwrap();

    let req = Request::get(format!("http://{addr}/greeting?lang=en"))
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = client.send(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().unwrap(), "hello");

    let head = head.await.unwrap();
    assert!(head.starts_with("GET /greeting?lang=en HTTP/1.1\r\n"), "{head}");
    assert!(head.to_ascii_lowercase().contains(&format!("host: {addr}")), "{head}");
}

#[tokio::test]
async fn test_request_builder_post() {
    let (addr, head) = serve_once("created").await;
    let client = Client::new(config()).unwrap();

    let resp = client
        .post(format!("http://{addr}/items"))
        .header("X-Custom", "value")
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.into_body(), Bytes::from_static(b"created"));

    let head = head.await.unwrap().to_ascii_lowercase();
    assert!(head.starts_with("post /items http/1.1"), "{head}");
    assert!(head.contains("x-custom: value"));
}

#[tokio::test]
async fn test_https_rejected() {
    let client = Client::new(config()).unwrap();

    let err = client.get("https://example.com/").send().await.unwrap_err();
    assert!(matches!(err, NetError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_connection_refused_surfaces_dial_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let client = Client::new(config()).unwrap();

    let err = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_connection_failure(), "{err:?}");
}

#[tokio::test]
async fn test_dropped_connection_is_retried_once() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let mut chunk = [0u8; 1024];
            let _ = socket.read(&mut chunk).await;
            if n == 0 {
                // Close without answering.
                drop(socket);
                continue;
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                .await
                .unwrap();
            let _ = socket.shutdown().await;
        }
    });

    let client = Client::new(config()).unwrap();
    let resp = client.get(format!("http://{addr}/")).send().await.unwrap();

    assert_eq!(resp.text().unwrap(), "ok");
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_second_failure_is_returned() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            counter.fetch_add(1, Ordering::SeqCst);
            let mut chunk = [0u8; 1024];
            let _ = socket.read(&mut chunk).await;
        }
    });

    let client = Client::new(config()).unwrap();
    let err = client.get(format!("http://{addr}/")).send().await.unwrap_err();

    assert!(matches!(err, NetError::ConnectionClosed), "{err:?}");
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}
