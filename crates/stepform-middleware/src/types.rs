//! Common types used throughout the middleware pipeline.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use thiserror::Error;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a fully collected body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Transport peer address, stored in the request extensions by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);

/// Why the server could not collect a request body.
///
/// The server still forwards the request, with an empty body and this value
/// in its extensions, so the failure is answered and access-logged like any
/// other bad body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    /// The client did not finish sending the body in time.
    #[error("request body not received within {0:?}")]
    Timeout(Duration),

    /// The connection failed while the body was being read.
    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a JSON response from a serializable body.
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Response;

    /// Creates a response without a body.
    fn empty(status: StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
        let (status, bytes) = match serde_json::to_vec(body) {
            Ok(bytes) => (status, bytes),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"code":500,"message":"Invalid application state"}"#.to_vec(),
            ),
        };

        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Full::new(Bytes::from(bytes)))
            .expect("failed to build JSON response")
    }

    fn empty(status: StatusCode) -> Response {
        http::Response::builder()
            .status(status)
            .body(Full::new(Bytes::new()))
            .expect("failed to build empty response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_json_response() {
        let response = Response::json(StatusCode::CREATED, &serde_json::json!({"id": 1}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"id":1}"#);
    }

    #[test]
    fn test_body_error_display() {
        let timeout = BodyError::Timeout(Duration::from_millis(250));
        assert_eq!(timeout.to_string(), "request body not received within 250ms");

        let read = BodyError::Read("connection reset".to_string());
        assert!(read.to_string().contains("connection reset"));
    }

    #[test]
    fn test_empty_response() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(http::header::CONTENT_TYPE).is_none());
    }
}
