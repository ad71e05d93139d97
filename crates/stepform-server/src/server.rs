//! HTTP server.
//!
//! Built on hyper and Tokio. Every connection is served over HTTP/1.1 on
//! its own task. For each request the server:
//!
//! - collects the body, bounded by the configured request timeout
//! - records the peer address as a [`RemoteAddr`] extension
//! - hands the request to the application [`Service`]
//!
//! A body that cannot be collected is not answered here. The request goes
//! on with an empty body and a [`BodyError`] extension, so the application
//! answers it through its normal error path.
//!
//! On shutdown the server stops accepting, asks open connections to finish
//! their current request, and waits up to the shutdown timeout for them.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use stepform_middleware::{BodyError, BoxFuture, RemoteAddr, Request, Response};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The application behind the server.
///
/// Implemented for any `Fn(Request) -> impl Future<Output = Response>`.
pub trait Service: Send + Sync + 'static {
    /// Answers one request. The response is final; the server does not
    /// inspect or rewrite it.
    fn call(&self, request: Request) -> BoxFuture<'_, Response>;
}

impl<F, Fut> Service for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(self(request))
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("failed to bind to {addr}")]
    Bind {
        /// The configured address.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The listener's local address could not be read.
    #[error("failed to read listener address")]
    LocalAddr(#[source] std::io::Error),
}

/// The HTTP server.
///
/// # Example
///
/// ```rust,no_run
/// use stepform_middleware::{Request, Response, ResponseExt};
/// use stepform_server::{Server, ServerConfig};
///
/// # async fn run() -> Result<(), stepform_server::ServerError> {
/// let config = ServerConfig::new("127.0.0.1:8080");
/// let server = Server::new(config, |_req: Request| async {
///     Response::empty(http::StatusCode::NO_CONTENT)
/// });
///
/// server.run().await
/// # }
/// ```
pub struct Server<S> {
    config: ServerConfig,
    service: Arc<S>,
}

impl<S: Service> Server<S> {
    /// Creates a server that answers requests with `service`.
    #[must_use]
    pub fn new(config: ServerConfig, service: S) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.http_addr())
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
        tracing::info!(addr = %local_addr, "Server listening");

        let tracker = ConnectionTracker::new();
        let request_timeout = self.config.request_timeout();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let service = Arc::clone(&self.service);
                            let guard = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(
                                    service,
                                    stream,
                                    remote_addr,
                                    request_timeout,
                                    shutdown,
                                )
                                .await
                                {
                                    tracing::debug!(%remote_addr, error = %e, "Connection error");
                                }
                                drop(guard);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        drop(listener);

        let shutdown_timeout = self.config.shutdown_timeout();
        tracing::info!(
            timeout = ?shutdown_timeout,
            active = tracker.active_connections(),
            "Waiting for open connections"
        );

        tokio::select! {
            () = tracker.drained() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "Shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn serve_connection<S: Service>(
    service: Arc<S>,
    stream: TcpStream,
    remote_addr: SocketAddr,
    request_timeout: Duration,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let hyper_service = service_fn(move |req: http::Request<Incoming>| {
        let service = Arc::clone(&service);
        async move {
            let request = collect_request(req, remote_addr, request_timeout).await;
            Ok::<_, Infallible>(service.call(request).await)
        }
    });

    let conn = http1::Builder::new().serve_connection(io, hyper_service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

/// Collects the body of `req` and attaches transport facts as extensions.
async fn collect_request(
    req: http::Request<Incoming>,
    remote_addr: SocketAddr,
    timeout: Duration,
) -> Request {
    let (mut parts, body) = req.into_parts();
    parts.extensions.insert(RemoteAddr(remote_addr));

    let bytes = match tokio::time::timeout(timeout, body.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => {
            parts.extensions.insert(BodyError::Read(e.to_string()));
            Bytes::new()
        }
        Err(_) => {
            parts.extensions.insert(BodyError::Timeout(timeout));
            Bytes::new()
        }
    };

    Request::from_parts(parts, Full::new(bytes))
}
