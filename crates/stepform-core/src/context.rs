//! Request context types.
//!
//! The [`RequestContext`] is what a handler sees of the pipeline: the request
//! ID, the logger and, on protected routes, the caller's claims.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::claims::IdentityClaims;
use crate::error::ApiError;
use crate::logger::Logger;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines of one request easy to
/// correlate and sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request state handed to handlers and the error translator.
///
/// A context cannot exist without a logger, so looking one up never fails.
/// Claims are `None` on public routes and always `Some` once the
/// authentication stage has let a request through.
///
/// # Example
///
/// ```
/// use stepform_core::{IdentityClaims, Logger, RequestContext};
///
/// let ctx = RequestContext::new(Logger::disabled());
/// assert!(ctx.claims().is_none());
///
/// let ctx = ctx.with_claims(IdentityClaims::new("u1", "user1", 0, 3600));
/// assert_eq!(ctx.claims().unwrap().user_id, "u1");
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    logger: Logger,
    claims: Option<IdentityClaims>,
}

impl RequestContext {
    /// Creates a context bound to `logger`, with a fresh request ID.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            request_id: RequestId::new(),
            logger,
            claims: None,
        }
    }

    /// Replaces the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attaches the caller's claims.
    #[must_use]
    pub fn with_claims(mut self, claims: IdentityClaims) -> Self {
        self.claims = Some(claims);
        self
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

    /// Returns the caller's claims, if the request was authenticated.
    #[must_use]
    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.claims.as_ref()
    }

    /// Returns the caller's claims or an `Unauthorized` error.
    pub fn require_claims(&self) -> Result<&IdentityClaims, ApiError> {
        self.claims.as_ref().ok_or_else(ApiError::unauthorized)
    }
}
