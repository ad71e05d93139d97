//! Error translation.
//!
//! The single place where an [`ApiError`] becomes an HTTP response. Clients
//! only ever see the fixed messages of [`ErrorKind`], the validation
//! template, or (for `InvalidRequestBody` only) the decoder's message. The
//! full error, cause included, goes to the request's logger.
//!
//! ```text
//! ApiError::Validation(set) ─► 400 {code, message, errors:[{field, message}]}
//! ApiError::<Kind> { .. }   ─► kind.status_code() {code, message}
//! ApiError::Unhandled(_)    ─► 500 {code:500, message:"Invalid application state"}
//! ```

use http::StatusCode;
use serde::{Deserialize, Serialize};
use stepform_core::{ApiError, ErrorKind, RequestContext, ValidationFailures};

use crate::types::{Response, ResponseExt};

/// Message of every validation response.
pub const VALIDATION_MESSAGE: &str = "One or more fields failed validation.";

/// Generic error body: `{"code": 404, "message": "Resource not found"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub code: u16,
    /// Client message.
    pub message: String,
}

/// One failing field in a [`ValidationErrorResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorResponse {
    /// Field name.
    pub field: String,
    /// `Field validation for '<tag>' failed.`
    pub message: String,
}

/// Validation error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    /// Always 400.
    pub code: u16,
    /// Always [`VALIDATION_MESSAGE`].
    pub message: String,
    /// One entry per failure, in order.
    pub errors: Vec<FieldErrorResponse>,
}

/// Either error body shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    /// Validation failures.
    Validation(ValidationErrorResponse),
    /// Everything else.
    Generic(ErrorResponse),
}

/// Computes status and body for `error` without logging.
///
/// Pure: the same error always yields the same output.
#[must_use]
pub fn render(error: &ApiError) -> (StatusCode, ErrorBody) {
    match error {
        ApiError::Validation(failures) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::Validation(validation_body(failures)),
        ),
        ApiError::InvalidRequestBody { source } => {
            let message = match source {
                Some(cause) => format!("Invalid request body: {cause:#}"),
                None => ErrorKind::InvalidRequestBody.message().to_string(),
            };
            generic(ErrorKind::InvalidRequestBody.status_code(), message)
        }
        ApiError::InvalidApplicationState { .. } => classified(ErrorKind::InvalidApplicationState),
        ApiError::PermissionDenied { .. } => classified(ErrorKind::PermissionDenied),
        ApiError::InvalidInput { .. } => classified(ErrorKind::InvalidInput),
        ApiError::ResourceNotFound { .. } => classified(ErrorKind::ResourceNotFound),
        ApiError::InvalidCredentials { .. } => classified(ErrorKind::InvalidCredentials),
        ApiError::Unauthorized { .. } => classified(ErrorKind::Unauthorized),
        ApiError::Unhandled(_) => classified(ErrorKind::InvalidApplicationState),
    }
}

/// Logs `error` through the request's logger and builds the response.
pub fn translate(ctx: &RequestContext, error: &ApiError) -> Response {
    let request_id = ctx.request_id();

    ctx.logger().in_scope(|| match error {
        ApiError::Validation(failures) => {
            tracing::error!(%request_id, error = %error, failures = ?failures, "Validation error occurred");
        }
        ApiError::Unhandled(cause) => {
            tracing::error!(%request_id, error = ?cause, "Unhandled internal server error");
        }
        classified => {
            let kind = classified.kind().map_or("unknown", ErrorKind::name);
            let cause = classified
                .cause()
                .map(|c| format!("{c:#}"))
                .unwrap_or_default();
            tracing::error!(
                %request_id,
                kind,
                error = %classified,
                cause = %cause,
                "Error occurred while handling request"
            );
        }
    });

    let (status, body) = render(error);
    Response::json(status, &body)
}

fn classified(kind: ErrorKind) -> (StatusCode, ErrorBody) {
    generic(kind.status_code(), kind.message().to_string())
}

fn generic(status: StatusCode, message: String) -> (StatusCode, ErrorBody) {
    (
        status,
        ErrorBody::Generic(ErrorResponse {
            code: status.as_u16(),
            message,
        }),
    )
}

fn validation_body(failures: &ValidationFailures) -> ValidationErrorResponse {
    ValidationErrorResponse {
        code: StatusCode::BAD_REQUEST.as_u16(),
        message: VALIDATION_MESSAGE.to_string(),
        errors: failures
            .iter()
            .map(|f| FieldErrorResponse {
                field: f.field().to_string(),
                message: f.message(),
            })
            .collect(),
    }
}
