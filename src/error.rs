//! Error types shared by the store and the services

use thiserror::Error;

use crate::progress::Rejection;

/// Convenience alias for library results
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while reading or mutating SkillPath data
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before anything was written
    #[error("{0}")]
    Validation(String),

    /// A referenced document does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity (e.g. "lesson")
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The session's role may not perform this action
    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// The write would violate a uniqueness rule
    #[error("{0}")]
    Conflict(String),

    /// A tracker rule refused the operation
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The document store reported a failure
    #[error("Store error: {0}")]
    Store(String),

    /// Filesystem failure in a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document did not match the expected record shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    /// Check if this error should be shown to the user as an inline message
    /// rather than logged as a failure
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotFound { .. }
                | Error::Forbidden(_)
                | Error::Conflict(_)
                | Error::Rejected(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = Error::not_found("lesson", "abc");
        assert_eq!(err.to_string(), "lesson not found: abc");
    }

    #[test]
    fn store_failures_are_not_user_facing() {
        assert!(Error::Validation("Invalid class code".into()).is_user_facing());
        assert!(!Error::Store("unavailable".into()).is_user_facing());
    }
}
