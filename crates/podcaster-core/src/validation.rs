//! Field-level request validation.
//!
//! Validation functions collect every failing field into a [`Validator`]
//! and finish with a single [`ValidationErrors`] value, so a request that
//! misses both `name` and `description` reports both at once.
//!
//! ```
//! use podcaster_core::validation::Validator;
//!
//! let mut v = Validator::new();
//! v.require("name", "");
//! v.require("description", "");
//! let err = v.finish().unwrap_err();
//! assert_eq!(err.len(), 2);
//! ```

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Message used for required fields left empty.
pub const REQUIRED: &str = "is required";

/// Message used for identifiers that must not be the nil UUID.
pub const NOT_EMPTY: &str = "cannot be empty";

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.field, self.message)
    }
}

/// Every field that failed validation for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether `field` is among the failures.
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Append every failure from `other`.
    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// `Ok(())` when nothing failed, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field failures for one request.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn fail(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    /// Record a failure unless `ok` holds.
    pub fn check(
        &mut self,
        ok: bool,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> &mut Self {
        if !ok {
            self.fail(field, message);
        }
        self
    }

    /// The field must be a non-blank string.
    pub fn require(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, REQUIRED)
    }

    /// The identifier must not be the nil UUID.
    pub fn require_id(&mut self, field: &str, id: Uuid) -> &mut Self {
        self.check(!id.is_nil(), field, NOT_EMPTY)
    }

    /// The optional identifier must be present and not nil.
    pub fn require_some_id(&mut self, field: &str, id: Option<Uuid>) -> &mut Self {
        match id {
            Some(id) => self.require_id(field, id),
            None => self.fail(field, REQUIRED),
        }
    }

    /// If present, the identifier must not be nil.
    pub fn optional_id(&mut self, field: &str, id: Option<Uuid>) -> &mut Self {
        match id {
            Some(id) => self.require_id(field, id),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish validation, yielding every recorded failure at once.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }
}

/// Map an update-request string to a patch field: empty or blank means
/// "do not change", so an update can never store a value create would reject.
pub fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
