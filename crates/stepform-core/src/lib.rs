//! # Stepform Core
//!
//! Core types shared by every stepform crate:
//!
//! - [`ApiError`] / [`ErrorKind`] - the classified error taxonomy
//! - [`ValidationFailures`] - ordered per-field validation failures
//! - [`IdentityClaims`] - the caller decoded from a bearer token
//! - [`RequestContext`] - per-request logger and claims
//! - [`Logger`] - explicit, immutable logger handle

#![doc(html_root_url = "https://docs.rs/stepform-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod claims;
mod context;
mod error;
mod logger;
pub mod validation;

pub use claims::IdentityClaims;
pub use context::{RequestContext, RequestId};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use logger::Logger;
pub use validation::{FieldFailure, Validate, ValidationFailures};
