//! Server tests over a real socket bound to `127.0.0.1:0`.

use std::time::Duration;

use http::StatusCode;
use serde_json::json;
use stepform_middleware::{BodyError, RemoteAddr, Request, Response, ResponseExt};
use stepform_server::{Server, ServerConfig, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Echoes what the server attached to the request.
async fn describe(request: Request) -> Response {
    let body_error = request.extensions().get::<BodyError>().cloned();
    if let Some(error) = body_error {
        return Response::json(StatusCode::BAD_REQUEST, &json!({ "error": error.to_string() }));
    }

    let peer = request
        .extensions()
        .get::<RemoteAddr>()
        .map(|RemoteAddr(addr)| addr.ip().to_string());
    let body = http_body_util::BodyExt::collect(request.into_body())
        .await
        .map(|c| c.to_bytes())
        .unwrap_or_default();

    Response::json(
        StatusCode::OK,
        &json!({ "peer": peer, "body": String::from_utf8_lossy(&body) }),
    )
}

struct Running {
    addr: std::net::SocketAddr,
    shutdown: ShutdownSignal,
    handle: JoinHandle<Result<(), stepform_server::ServerError>>,
}

async fn start(request_timeout: Duration) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig::default()
        .with_request_timeout(request_timeout)
        .with_shutdown_timeout(Duration::from_millis(200));
    let shutdown = ShutdownSignal::new();
    let server = Server::new(config, describe);

    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));
    Running {
        addr,
        shutdown,
        handle,
    }
}

/// Reads one response: the head plus `Content-Length` bytes of body.
async fn read_response(stream: &mut TcpStream) -> (u16, serde_json::Value) {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut chunk))
            .await
            .expect("response in time")
            .unwrap();
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let head = &text[..head_end];
            let length: usize = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse().ok())
                        .flatten()
                })
                .unwrap_or(0);

            let body_start = head_end + 4;
            if buf.len() >= body_start + length {
                let status = head
                    .split_whitespace()
                    .nth(1)
                    .and_then(|s| s.parse().ok())
                    .unwrap();
                let body = serde_json::from_slice(&buf[body_start..body_start + length])
                    .unwrap_or(serde_json::Value::Null);
                return (status, body);
            }
        }

        assert!(n > 0, "connection closed before a full response");
    }
}

#[tokio::test]
async fn test_request_reaches_service_with_peer_and_body() {
    let running = start(Duration::from_secs(5)).await;

    let mut stream = TcpStream::connect(running.addr).await.unwrap();
    stream
        .write_all(
            b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await
        .unwrap();

    let (status, body) = read_response(&mut stream).await;
    assert_eq!(status, 200);
    assert_eq!(body["peer"], "127.0.0.1");
    assert_eq!(body["body"], "hello");

    running.shutdown.trigger();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_slow_body_is_forwarded_as_body_error() {
    let running = start(Duration::from_millis(100)).await;

    let mut stream = TcpStream::connect(running.addr).await.unwrap();
    stream
        .write_all(b"POST /form HTTP/1.1\r\nHost: localhost\r\nContent-Length: 20\r\n\r\n{\"na")
        .await
        .unwrap();

    let (status, body) = read_response(&mut stream).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("not received within"));

    running.shutdown.trigger();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_with_idle_connection() {
    let running = start(Duration::from_secs(5)).await;

    // A keep-alive connection that never sends a request.
    let _idle = TcpStream::connect(running.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    running.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), running.handle)
        .await
        .expect("server stops within the shutdown timeout")
        .unwrap()
        .unwrap();

    assert!(TcpStream::connect(running.addr).await.is_err());
}
