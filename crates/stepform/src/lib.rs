//! # Stepform
//!
//! A forms and steps API with bearer-token authentication.
//!
//! ```text
//! POST   {base}/login                          public
//! POST   {base}/form                           bearer
//! GET    {base}/form/{formId}                  bearer
//! PATCH  {base}/form/{formId}                  bearer
//! GET    {base}/form/{formId}/steps/{stepId}   bearer
//! PATCH  {base}/form/{formId}/steps/{stepId}   bearer
//! DELETE {base}/form/{formId}/steps/{stepId}   bearer
//! GET    /health                               public
//! ```
//!
//! Requests flow through the pipeline from `stepform-middleware`: every
//! request is access-logged, protected routes are authenticated, and any
//! handler failure is answered by the error translator.
//!
//! ## Layers
//!
//! - [`handlers`] decode and validate bodies, then call the service
//! - [`service::FormService`] applies the business rules
//! - [`repository`] is the storage port, with [`InMemoryStore`] behind it
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use stepform::{App, InMemoryStore};
//! use stepform_config::{ConfigLoader, SecretKey};
//! use stepform_core::Logger;
//!
//! let config = ConfigLoader::new()
//!     .with_secret(SecretKey::new("s3cr3t"))
//!     .load()
//!     .unwrap();
//! let app = App::from_config(&config, Arc::new(InMemoryStore::new()), Logger::disabled());
//! # drop(app);
//! ```

#![doc(html_root_url = "https://docs.rs/stepform/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod dto;
pub mod handlers;
pub mod model;
pub mod password;
pub mod repository;
pub mod service;

pub use app::{routes, seed_user, App, Route};
pub use repository::{CredentialsRepository, FormRepository, InMemoryStore, RepositoryError};
pub use service::FormService;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
