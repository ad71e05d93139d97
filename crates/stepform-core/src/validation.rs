//! Field validation and failure aggregation.
//!
//! Request DTOs implement [`Validate`]; a failed validation yields an ordered
//! [`ValidationFailures`] set that the error translator renders as a 400
//! response with one entry per failing field.

use serde::Serialize;
use thiserror::Error;

/// Tag for a field that must be present and non-empty.
pub const REQUIRED: &str = "required";

/// Tag for a field below its minimum length or value.
pub const MIN: &str = "min";

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    field: String,
    tag: String,
}

impl FieldFailure {
    /// Creates a failure for `field` with the rule tag that rejected it.
    pub fn new(field: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
        }
    }

    /// The offending field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The rule tag, e.g. `required` or `min`.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Client message for this failure.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Field validation for '{}' failed.", self.tag)
    }
}

/// Ordered set of field failures.
///
/// # Example
///
/// ```
/// use stepform_core::validation::{ValidationFailures, REQUIRED};
///
/// let mut failures = ValidationFailures::new();
/// failures.require("Name", "");
/// assert_eq!(failures.len(), 1);
/// assert_eq!(failures.iter().next().unwrap().tag(), REQUIRED);
/// assert!(failures.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .failures.len())]
pub struct ValidationFailures {
    failures: Vec<FieldFailure>,
}

impl ValidationFailures {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure.
    pub fn push(&mut self, field: impl Into<String>, tag: impl Into<String>) {
        self.failures.push(FieldFailure::new(field, tag));
    }

    /// Records `required` when `value` is empty.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.push(field, REQUIRED);
        }
    }

    /// Records `min` when `actual` is below `min`.
    pub fn min<T: PartialOrd>(&mut self, field: &str, actual: T, min: T) {
        if actual < min {
            self.push(field, MIN);
        }
    }

    /// Appends all failures of a nested value, prefixing their field names.
    pub fn nested(&mut self, prefix: &str, inner: Self) {
        self.failures.extend(
            inner
                .failures
                .into_iter()
                .map(|f| FieldFailure::new(format!("{prefix}.{}", f.field), f.tag)),
        );
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` when nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Iterates over failures in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldFailure> {
        self.failures.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<'a> IntoIterator for &'a ValidationFailures {
    type Item = &'a FieldFailure;
    type IntoIter = std::slice::Iter<'a, FieldFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<FieldFailure> for ValidationFailures {
    fn from_iter<I: IntoIterator<Item = FieldFailure>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

/// Types that can check their own fields.
pub trait Validate {
    /// Returns every failing field, in declaration order.
    fn validate(&self) -> Result<(), ValidationFailures>;
}
