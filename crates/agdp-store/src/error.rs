//! Error types for store operations.

use std::borrow::Cow;

use uuid::Uuid;

/// Error type for all store operations.
///
/// Variants map onto the failure classes callers need to distinguish:
/// a missing record, an operation that is not permitted in the record's
/// current state, and malformed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[must_use = "store errors should be handled appropriately"]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of record that was looked up.
        resource: &'static str,
        /// Identifier that was looked up.
        id: Uuid,
    },

    /// The operation conflicts with the current state of the record.
    ///
    /// Examples are editing an archived pipeline or storing artifacts for a
    /// pipeline that was modified while generation was in progress.
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),

    /// The record is not in a state that allows the requested transition.
    #[error("Invalid state: {0}")]
    InvalidState(Cow<'static, str>),

    /// The supplied data is malformed.
    #[error("Validation failed: {0}")]
    Validation(Cow<'static, str>),
}

impl StoreError {
    /// Creates a [`StoreError::NotFound`] for a pipeline.
    #[inline]
    pub fn pipeline_not_found(id: Uuid) -> Self {
        Self::NotFound {
            resource: "pipeline",
            id,
        }
    }

    /// Creates a [`StoreError::NotFound`] for an execution.
    #[inline]
    pub fn execution_not_found(id: Uuid) -> Self {
        Self::NotFound {
            resource: "execution",
            id,
        }
    }

    /// Creates a [`StoreError::Conflict`].
    #[inline]
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a [`StoreError::InvalidState`].
    #[inline]
    pub fn invalid_state(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates a [`StoreError::Validation`].
    #[inline]
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns whether this error reports a missing record.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Specialized [`Result`] type for store operations.
pub type StoreResult<T, E = StoreError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_resource() {
        let id = Uuid::nil();
        let error = StoreError::pipeline_not_found(id);
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), format!("pipeline {id} not found"));
    }

    #[test]
    fn conflict_keeps_message() {
        let error = StoreError::conflict("pipeline is archived");
        assert_eq!(error.to_string(), "Conflict: pipeline is archived");
        assert!(!error.is_not_found());
    }
}
