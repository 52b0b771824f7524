//! Error types for the podcaster backoffice.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::models::Relation;
use crate::validation::ValidationErrors;

/// Result type alias using the backoffice Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by callers to map errors to client or server
/// statuses without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// One or more request fields are missing or malformed.
    Validation,
    /// A referenced entity or association does not exist.
    NotFound,
    /// An association points at a child that cannot be resolved.
    Inconsistent,
    /// The backing store call failed.
    Persistence,
    /// Configuration is missing or invalid.
    Config,
}

/// The step of an overwrite that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteStep {
    /// Reading the current associations of the parent.
    Fetch,
    /// Deleting one existing association.
    Delete(Uuid),
    /// Creating the association for one desired child.
    Create(Uuid),
    /// Committing the replacement.
    Commit,
}

impl fmt::Display for OverwriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Delete(id) => write!(f, "delete of association {}", id),
            Self::Create(child) => write!(f, "create for child {}", child),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// Core error type for backoffice operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Request validation failed (one or more fields)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Entity or association not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Association references a child that no longer resolves
    #[error("Inconsistent {relation}: parent {parent_id} references missing child {child_id}")]
    Inconsistent {
        relation: Relation,
        parent_id: Uuid,
        child_id: Uuid,
    },

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database operation failed, with the operation and target recorded
    #[error("Database error during {op} on {target}: {source}")]
    Persistence {
        op: &'static str,
        target: String,
        #[source]
        source: sqlx::Error,
    },

    /// Non-SQL storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Overwrite of a parent's associations failed
    #[error(
        "Overwrite of {relation} for parent {parent_id} failed at {step} (partial: {partial}): {source}"
    )]
    Overwrite {
        relation: Relation,
        parent_id: Uuid,
        step: OverwriteStep,
        /// True when rows were already deleted or created before the failure
        /// and nothing rolled them back.
        partial: bool,
        #[source]
        source: Box<Error>,
    },

    /// Error wrapped with the operation that produced it
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify this error, looking through context and overwrite wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Inconsistent { .. } => ErrorKind::Inconsistent,
            Error::Database(_) | Error::Persistence { .. } | Error::Storage(_) => {
                ErrorKind::Persistence
            }
            Error::Overwrite { source, .. } | Error::Context { source, .. } => source.kind(),
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for a not-found error.
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Error::NotFound { entity, id }
    }

    /// Build a mapper that records the operation and target of a failed
    /// sqlx call.
    pub fn persistence(
        op: &'static str,
        target: impl Into<String>,
    ) -> impl FnOnce(sqlx::Error) -> Error {
        let target = target.into();
        move |source| Error::Persistence { op, target, source }
    }

    /// Wrap this error with operation context.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context and overwrite wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Overwrite { source, .. } | Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Validation details, if this error (or its root) is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self.root() {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Attach operation context to a `Result`.
pub trait ResultExt<T> {
    /// Wrap the error, if any, with a fixed context message.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error, if any, with a lazily built context message.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldError;

    #[test]
    fn test_error_display_not_found() {
        let id = Uuid::nil();
        let err = Error::not_found("wall", id);
        assert_eq!(err.to_string(), format!("wall not found: {}", id));
    }

    #[test]
    fn test_error_display_inconsistent() {
        let parent = Uuid::new_v4();
        let child = Uuid::new_v4();
        let err = Error::Inconsistent {
            relation: Relation::WallBlock,
            parent_id: parent,
            child_id: child,
        };
        let msg = err.to_string();
        assert!(msg.contains("wall_block"));
        assert!(msg.contains(&parent.to_string()));
        assert!(msg.contains(&child.to_string()));
    }

    #[test]
    fn test_kind_looks_through_context() {
        let err = Error::not_found("block", Uuid::nil())
            .context("finding block")
            .context("resolving wall blocks");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err.root(), Error::NotFound { .. }));
    }

    #[test]
    fn test_kind_looks_through_overwrite() {
        let err = Error::Overwrite {
            relation: Relation::BlockProgram,
            parent_id: Uuid::nil(),
            step: OverwriteStep::Commit,
            partial: false,
            source: Box::new(Error::Storage("disk full".to_string())),
        };
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(err.to_string().contains("failed at commit"));
    }

    #[test]
    fn test_validation_errors_accessor() {
        let errors = ValidationErrors::from(vec![FieldError::new("name", "is required")]);
        let err = Error::from(errors).context("creating wall");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.validation_errors().map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_persistence_mapper_records_target() {
        let id = Uuid::new_v4();
        let err = Error::persistence("update", format!("wall {}", id))(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(err.to_string().contains("during update on wall"));
    }

    #[test]
    fn test_result_ext_with_context() {
        let result: Result<()> = Err(Error::Storage("boom".to_string()));
        let err = result.with_context(|| "loading".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "loading: Storage error: boom");
    }

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::Validation("max_connections must be at least 1".to_string())
            .into();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("max_connections"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
