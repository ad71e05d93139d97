//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries state through the pipeline. It is
//! separate from [`RequestContext`] so stages can enrich it before the
//! handler receives an immutable view.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use http::Method;
use stepform_core::{IdentityClaims, Logger, RequestContext, RequestId};

use crate::types::{RemoteAddr, Request};

/// Context that flows through the middleware pipeline.
///
/// Created by the pipeline driver for every request, always with the
/// pipeline's logger. Stages fill in the client address and claims.
///
/// # Example
///
/// ```
/// use stepform_core::{IdentityClaims, Logger};
/// use stepform_middleware::{MiddlewareContext, Request};
///
/// let request: Request = http::Request::builder()
///     .uri("/ping?foo=bar")
///     .body(Default::default())
///     .unwrap();
///
/// let mut ctx = MiddlewareContext::new(Logger::disabled(), &request);
/// assert_eq!(ctx.path(), "/ping?foo=bar");
///
/// ctx.set_claims(IdentityClaims::new("u1", "user1", 0, 3600));
/// assert!(ctx.to_request_context().claims().is_some());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    logger: Logger,
    claims: Option<IdentityClaims>,
    method: Method,
    path: String,
    remote_addr: Option<SocketAddr>,
    client_ip: Option<String>,
    started_at: Instant,
}

impl MiddlewareContext {
    /// Creates a context for `request`, bound to `logger`.
    #[must_use]
    pub fn new(logger: Logger, request: &Request) -> Self {
        let uri = request.uri();
        let path = match uri.query() {
            Some(query) => format!("{}?{query}", uri.path()),
            None => uri.path().to_string(),
        };

        Self {
            request_id: RequestId::new(),
            logger,
            claims: None,
            method: request.method().clone(),
            path,
            remote_addr: request.extensions().get::<RemoteAddr>().map(|r| r.0),
            client_ip: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the logger bound to this request.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Returns the caller's claims, if authenticated.
    #[must_use]
    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.claims.as_ref()
    }

    /// Stores the caller's claims.
    ///
    /// Only the authentication stage should call this.
    pub fn set_claims(&mut self, claims: IdentityClaims) {
        self.claims = Some(claims);
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path, with `?query` when one was sent.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the transport peer address, if the server provided one.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns the resolved client IP, once a stage has computed it.
    #[must_use]
    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    /// Stores the resolved client IP.
    pub fn set_client_ip(&mut self, ip: impl Into<String>) {
        self.client_ip = Some(ip.into());
    }

    /// Returns the time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Builds the immutable context handed to the handler.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        let ctx = RequestContext::new(self.logger.clone()).with_request_id(self.request_id);
        match &self.claims {
            Some(claims) => ctx.with_claims(claims.clone()),
            None => ctx,
        }
    }
}
