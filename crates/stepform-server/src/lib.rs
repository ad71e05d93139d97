//! # Stepform Server
//!
//! HTTP server infrastructure for the stepform backend:
//!
//! - HTTP/1.1 via hyper, one task per connection
//! - bounded request body collection
//! - a path router with `{param}` templates
//! - graceful shutdown on SIGINT/SIGTERM
//!
//! The server knows nothing about authentication, logging stages or error
//! bodies. It hands fully collected requests to a [`Service`] and writes
//! back whatever that service answers.

#![doc(html_root_url = "https://docs.rs/stepform-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerError, Service};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
