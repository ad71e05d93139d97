//! Pipeline stages.
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`access_log`] | Resolve the client IP, emit one access-log record per request |
//! | [`auth`] | Verify the bearer token and attach the caller's claims |
//!
//! Public routes run only [`AccessLog`]. Protected routes run
//! [`AccessLog`] then [`Authenticate`].

pub mod access_log;
pub mod auth;

pub use access_log::AccessLog;
pub use auth::{AuthErrorResponse, Authenticate};
