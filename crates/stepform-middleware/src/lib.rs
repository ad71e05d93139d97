//! # Stepform Middleware
//!
//! The request pipeline of the stepform backend.
//!
//! ## Pipeline
//!
//! ```text
//! Request → AccessLog → Authenticate (protected routes) → Handler
//!                              │                            │
//!                     401 {"error": ...}           Err(ApiError) / panic
//!                              │                            ↓
//!                              │                     Error translator
//!                              ↓                            ↓
//! Response ← AccessLog (one record per request) ←───────────┘
//! ```
//!
//! | Stage | Middleware | Purpose |
//! |-------|-----------|---------|
//! | 1 | [`AccessLog`] | Resolve client IP; log method, path, status, latency |
//! | 2 | [`Authenticate`] | Verify the bearer token, attach claims or reject |
//!
//! Stages return an explicit [`Flow`]; the [`Pipeline`] driver decides what
//! runs next. Handler failures are turned into responses by
//! [`translate::translate`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use stepform_core::Logger;
//! use stepform_middleware::stages::{AccessLog, Authenticate};
//! use stepform_middleware::{Pipeline, TokenSigner};
//!
//! let signer = Arc::new(TokenSigner::new(b"secret"));
//! let protected = Pipeline::builder(Logger::disabled())
//!     .stage(AccessLog::new())
//!     .stage(Authenticate::new(signer))
//!     .build();
//!
//! assert_eq!(protected.stage_names(), ["access_log", "authenticate"]);
//! ```

#![doc(html_root_url = "https://docs.rs/stepform-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod token;
pub mod translate;
pub mod types;

// Re-export main types at crate root
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Flow, Middleware};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use stages::{AccessLog, Authenticate};
pub use token::{generate_token, verify_token, TokenError, TokenSigner};
pub use translate::{ErrorBody, ErrorResponse, FieldErrorResponse, ValidationErrorResponse};
pub use types::{BodyError, RemoteAddr, Request, Response, ResponseExt};
