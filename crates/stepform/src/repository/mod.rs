//! Persistence ports.
//!
//! The service talks to storage only through these traits.
//! [`InMemoryStore`] implements both.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Credentials, Form, FormStep};

mod memory;

pub use memory::InMemoryStore;

/// Storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No record with the requested key.
    #[error("{entity} {key} not found")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Lookup key.
        key: String,
    },

    /// A uniqueness constraint would be violated.
    #[error("{entity} with {field} {value:?} already exists")]
    Conflict {
        /// Kind of record.
        entity: &'static str,
        /// Constrained field.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// The storage backend failed.
    #[error("storage backend failure")]
    Backend(#[source] anyhow::Error),
}

impl RepositoryError {
    /// Creates a `NotFound` for `entity` keyed by `key`.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns `true` for [`RepositoryError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Form and step storage.
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Stores a new form with its steps. Identifiers are taken as given.
    async fn create_form(&self, form: Form) -> RepositoryResult<Form>;

    /// Loads a form with its steps ordered by `step_order`.
    async fn get_form(&self, id: Uuid) -> RepositoryResult<Form>;

    /// Saves the form's own fields. Steps are left untouched.
    async fn update_form(&self, form: Form) -> RepositoryResult<Form>;

    /// Loads one step.
    async fn get_step(&self, id: Uuid) -> RepositoryResult<FormStep>;

    /// Saves a step's name and content.
    async fn update_step(&self, step: FormStep) -> RepositoryResult<FormStep>;

    /// Removes a step.
    async fn delete_step(&self, id: Uuid) -> RepositoryResult<()>;
}

/// Login identity storage.
#[async_trait]
pub trait CredentialsRepository: Send + Sync {
    /// Loads the identity registered under `username`.
    async fn get_credentials_by_username(&self, username: &str) -> RepositoryResult<Credentials>;
}
