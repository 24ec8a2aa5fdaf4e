use porygo_core::Error;
use porygo_fetch::{Fetcher, HttpFetcher};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response and return the URL to request
async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}/page")
}

#[tokio::test]
async fn success_returns_the_body() {
    let url = serve_once("200 OK", "<html>hello</html>").await;
    let fetcher = HttpFetcher::new().unwrap();

    let body = fetcher.attempt(&url, Duration::from_secs(5)).await.unwrap();
    assert_eq!(body, b"<html>hello</html>");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let url = serve_once("404 Not Found", "missing").await;
    let fetcher = HttpFetcher::new().unwrap();

    let err = fetcher.attempt(&url, Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher
        .attempt(&format!("http://{addr}/"), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
}
