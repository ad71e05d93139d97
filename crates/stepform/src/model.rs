//! Domain records.
//!
//! These are the shapes the repository stores. They never leave the
//! process as-is; [`crate::dto`] holds the wire representations.

use std::fmt;

use uuid::Uuid;

/// A form and its ordered steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    /// Form identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Whether opens are tracked.
    pub open_tracking_enabled: bool,
    /// Whether clicks are tracked.
    pub click_tracking_enabled: bool,
    /// Steps, ordered by [`FormStep::step_order`].
    pub steps: Vec<FormStep>,
}

/// One step of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStep {
    /// Step identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Step body.
    pub content: String,
    /// Position within the form, starting at 1.
    pub step_order: i32,
    /// Owning form.
    pub form_id: Uuid,
}

/// A login identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User identifier, carried in issued tokens.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Argon2 hash in PHC string format.
    pub password_hash: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Builds absolute links to resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    public_url: String,
    base_url: String,
}

impl Links {
    /// Creates a link builder for resources served at
    /// `{public_url}{base_url}`.
    pub fn new(public_url: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
            base_url: base_url.into(),
        }
    }

    /// `{public}{base}/form/{form_id}`
    #[must_use]
    pub fn form(&self, form_id: Uuid) -> String {
        format!("{}{}/form/{form_id}", self.public_url, self.base_url)
    }

    /// `{public}{base}/form/{form_id}/steps/{step_id}`
    #[must_use]
    pub fn step(&self, form_id: Uuid, step_id: Uuid) -> String {
        format!(
            "{}{}/form/{form_id}/steps/{step_id}",
            self.public_url, self.base_url
        )
    }
}
