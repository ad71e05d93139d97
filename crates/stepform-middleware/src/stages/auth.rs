//! Bearer token authentication.
//!
//! Protected routes require `Authorization: Bearer <token>`. The stage
//! verifies the token and stores its claims in the context, or rejects the
//! request with 401 and a `{"error": ...}` body before the handler runs.
//! Expired and forged tokens get the same answer.

use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::context::MiddlewareContext;
use crate::middleware::{Flow, Middleware};
use crate::token::TokenSigner;
use crate::types::{Request, Response, ResponseExt};

/// Scheme prefix of the `Authorization` header, including the space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Rejection message for a missing or malformed header.
pub const MISSING_HEADER_MESSAGE: &str = "Authorization header is required";

/// Rejection message for a token that fails verification.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";

/// Body of an authentication rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthErrorResponse {
    /// Rejection message.
    pub error: String,
}

/// Stage that admits only callers holding a valid token.
#[derive(Debug, Clone)]
pub struct Authenticate {
    signer: Arc<TokenSigner>,
}

impl Authenticate {
    /// Creates the stage, verifying with `signer`.
    #[must_use]
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }
}

impl Middleware for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn on_request(&self, ctx: &mut MiddlewareContext, request: &Request) -> Flow {
        let request_id = ctx.request_id();

        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token);

        let Some(token) = token else {
            ctx.logger()
                .in_scope(|| tracing::warn!(%request_id, "Missing or malformed authorization header"));
            return reject(MISSING_HEADER_MESSAGE);
        };

        match self.signer.verify(token) {
            Ok(claims) => {
                ctx.logger().in_scope(|| {
                    tracing::debug!(%request_id, user_id = %claims.user_id, "Caller authenticated");
                });
                ctx.set_claims(claims);
                Flow::Proceed
            }
            Err(error) => {
                ctx.logger()
                    .in_scope(|| tracing::warn!(%request_id, error = ?error, "Token verification failed"));
                reject(INVALID_TOKEN_MESSAGE)
            }
        }
    }
}

/// Extracts the token from a `Bearer <token>` header value.
///
/// Returns `None` when the value is shorter than the prefix or uses another
/// scheme. The token itself may be empty; verification rejects it.
#[must_use]
pub fn bearer_token(value: &str) -> Option<&str> {
    if value.len() < BEARER_PREFIX.len() || !value.starts_with(BEARER_PREFIX) {
        return None;
    }
    Some(&value[BEARER_PREFIX.len()..])
}

fn reject(message: &str) -> Flow {
    Flow::ShortCircuit(Response::json(
        StatusCode::UNAUTHORIZED,
        &AuthErrorResponse {
            error: message.to_string(),
        },
    ))
}
