//! Classified errors for the stepform backend.
//!
//! Every failure a handler can report is an [`ApiError`]. Seven variants carry a
//! fixed [`ErrorKind`], each mapped to exactly one HTTP status and one client
//! message:
//!
//! | Kind | Status | Message |
//! |---|---|---|
//! | `InvalidApplicationState` | 500 | `Invalid application state` |
//! | `PermissionDenied` | 403 | `Permission denied` |
//! | `InvalidInput` | 400 | `Invalid input` |
//! | `ResourceNotFound` | 404 | `Resource not found` |
//! | `InvalidCredentials` | 401 | `Invalid credentials` |
//! | `Unauthorized` | 401 | `Unauthorized access` |
//! | `InvalidRequestBody` | 400 | `Invalid request body: <cause>` or `Invalid request body.` |
//!
//! Two further variants complete the taxonomy: [`ApiError::Validation`] holds a
//! [`ValidationFailures`] set, and [`ApiError::Unhandled`] is the catch-all for
//! anything that was never classified.
//!
//! The wrapped `source` of a variant is diagnostic only. It is logged by the
//! error translator and never written to a response, with the single exception
//! of `InvalidRequestBody`.

use http::StatusCode;
use thiserror::Error;

use crate::validation::ValidationFailures;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// The fixed enumeration of classified error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The server reached a state it cannot recover from for this request.
    InvalidApplicationState,
    /// The caller is known but may not perform the operation.
    PermissionDenied,
    /// The request was well formed but semantically unusable.
    InvalidInput,
    /// The addressed resource does not exist.
    ResourceNotFound,
    /// Username or password did not match.
    InvalidCredentials,
    /// The caller is not authenticated.
    Unauthorized,
    /// The request body could not be decoded.
    InvalidRequestBody,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::InvalidApplicationState,
        Self::PermissionDenied,
        Self::InvalidInput,
        Self::ResourceNotFound,
        Self::InvalidCredentials,
        Self::Unauthorized,
        Self::InvalidRequestBody,
    ];

    /// Returns the HTTP status for this kind.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::InvalidApplicationState => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::InvalidInput | Self::InvalidRequestBody => StatusCode::BAD_REQUEST,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Returns the fixed client message for this kind.
    ///
    /// For `InvalidRequestBody` this is the cause-less form; the error
    /// translator appends the cause when one is present.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidApplicationState => "Invalid application state",
            Self::PermissionDenied => "Permission denied",
            Self::InvalidInput => "Invalid input",
            Self::ResourceNotFound => "Resource not found",
            Self::InvalidCredentials => "Invalid credentials",
            Self::Unauthorized => "Unauthorized access",
            Self::InvalidRequestBody => "Invalid request body.",
        }
    }

    /// Returns a stable name for log fields.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InvalidApplicationState => "invalid_application_state",
            Self::PermissionDenied => "permission_denied",
            Self::InvalidInput => "invalid_input",
            Self::ResourceNotFound => "resource_not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::InvalidRequestBody => "invalid_request_body",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure reported by a repository, service or handler.
///
/// # Example
///
/// ```
/// use stepform_core::{ApiError, ErrorKind};
///
/// let err = ApiError::with_source(ErrorKind::ResourceNotFound, anyhow::anyhow!("no row"));
/// assert_eq!(err.kind(), Some(ErrorKind::ResourceNotFound));
/// assert_eq!(err.status_code(), http::StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// See [`ErrorKind::InvalidApplicationState`].
    #[error("invalid application state")]
    InvalidApplicationState {
        /// Diagnostic cause, never sent to clients.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// See [`ErrorKind::PermissionDenied`].
    #[error("permission denied")]
    PermissionDenied {
        /// Diagnostic cause, never sent to clients.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// See [`ErrorKind::InvalidInput`].
    #[error("invalid input")]
    InvalidInput {
        /// Diagnostic cause, never sent to clients.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// See [`ErrorKind::ResourceNotFound`].
    #[error("resource not found")]
    ResourceNotFound {
        /// Diagnostic cause, never sent to clients.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// See [`ErrorKind::InvalidCredentials`].
    #[error("invalid credentials")]
    InvalidCredentials {
        /// Diagnostic cause, never sent to clients.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// See [`ErrorKind::Unauthorized`].
    #[error("unauthorized access")]
    Unauthorized {
        /// Diagnostic cause, never sent to clients.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// See [`ErrorKind::InvalidRequestBody`].
    #[error("invalid request body")]
    InvalidRequestBody {
        /// The decoder error. Its text is surfaced in the response message.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// One or more request fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailures),

    /// A failure nobody classified.
    #[error("unhandled error: {0}")]
    Unhandled(anyhow::Error),
}

impl ApiError {
    /// Creates an error of the given kind without a cause.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self::build(kind, None)
    }

    /// Creates an error of the given kind wrapping a cause.
    pub fn with_source(kind: ErrorKind, source: impl Into<anyhow::Error>) -> Self {
        Self::build(kind, Some(source.into()))
    }

    fn build(kind: ErrorKind, source: Option<anyhow::Error>) -> Self {
        match kind {
            ErrorKind::InvalidApplicationState => Self::InvalidApplicationState { source },
            ErrorKind::PermissionDenied => Self::PermissionDenied { source },
            ErrorKind::InvalidInput => Self::InvalidInput { source },
            ErrorKind::ResourceNotFound => Self::ResourceNotFound { source },
            ErrorKind::InvalidCredentials => Self::InvalidCredentials { source },
            ErrorKind::Unauthorized => Self::Unauthorized { source },
            ErrorKind::InvalidRequestBody => Self::InvalidRequestBody { source },
        }
    }

    /// Internal failure with a diagnostic cause.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::with_source(ErrorKind::InvalidApplicationState, source)
    }

    /// Resource not found.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ErrorKind::ResourceNotFound)
    }

    /// Input that passed validation but cannot be applied.
    #[must_use]
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Wrong username or password.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials)
    }

    /// No authenticated caller.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized)
    }

    /// Undecodable request body.
    pub fn invalid_body(source: impl Into<anyhow::Error>) -> Self {
        Self::with_source(ErrorKind::InvalidRequestBody, source)
    }

    /// Wraps an error that was never classified.
    pub fn unhandled(source: impl Into<anyhow::Error>) -> Self {
        Self::Unhandled(source.into())
    }

    /// Returns the classified kind, or `None` for validation failures and
    /// unhandled errors.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::InvalidApplicationState { .. } => Some(ErrorKind::InvalidApplicationState),
            Self::PermissionDenied { .. } => Some(ErrorKind::PermissionDenied),
            Self::InvalidInput { .. } => Some(ErrorKind::InvalidInput),
            Self::ResourceNotFound { .. } => Some(ErrorKind::ResourceNotFound),
            Self::InvalidCredentials { .. } => Some(ErrorKind::InvalidCredentials),
            Self::Unauthorized { .. } => Some(ErrorKind::Unauthorized),
            Self::InvalidRequestBody { .. } => Some(ErrorKind::InvalidRequestBody),
            Self::Validation(_) | Self::Unhandled(_) => None,
        }
    }

    /// Returns the wrapped cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::InvalidApplicationState { source }
            | Self::PermissionDenied { source }
            | Self::InvalidInput { source }
            | Self::ResourceNotFound { source }
            | Self::InvalidCredentials { source }
            | Self::Unauthorized { source }
            | Self::InvalidRequestBody { source } => source.as_ref(),
            Self::Validation(_) => None,
            Self::Unhandled(source) => Some(source),
        }
    }

    /// Returns the HTTP status this error is answered with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unhandled(_) => ErrorKind::InvalidApplicationState.status_code(),
            other => other
                .kind()
                .map_or(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::status_code),
        }
    }
}
