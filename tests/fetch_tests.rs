use alphadb_cli::AppError;
use alphadb_cli::sources::{self, HttpFetch, ReqwestFetcher};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve exactly one HTTP response on a random local port and return its URL.
async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}/versions.json")
}

#[tokio::test]
async fn server_error_is_reported_as_http_status() {
    let url = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
    let fetcher = ReqwestFetcher::new().unwrap();

    let err = sources::fetch::resolve(&fetcher, &url).await.unwrap_err();
    assert!(matches!(err, AppError::HttpStatus { code: 500 }), "{err:?}");
    assert_eq!(err.to_string(), "URL responded with 500");
}

#[tokio::test]
async fn ok_response_is_decoded_as_json() {
    let url = serve_once("200 OK", r#"{"name":"shop","version":[]}"#).await;
    let fetcher = ReqwestFetcher::new().unwrap();

    let value = sources::fetch::resolve(&fetcher, &url).await.unwrap();
    assert_eq!(value["name"], "shop");
}

#[tokio::test]
async fn raw_get_returns_status_and_body() {
    let url = serve_once("404 Not Found", "missing").await;
    let fetcher = ReqwestFetcher::new().unwrap();

    let resp = fetcher.get(&url).await.unwrap();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, b"missing");
}

#[tokio::test]
async fn refused_connection_is_network_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = ReqwestFetcher::new().unwrap();
    let err = fetcher
        .get(&format!("http://{addr}/versions.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NetworkUnavailable(_)), "{err:?}");
}
