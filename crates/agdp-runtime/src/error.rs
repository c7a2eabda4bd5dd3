//! Error types for runtime operations.

use agdp_store::StoreError;
use uuid::Uuid;

/// Result type alias for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for generation, execution and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The referenced record does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of record that was looked up.
        resource: &'static str,
        /// Identifier that was looked up.
        id: Uuid,
    },

    /// The operation conflicts with the current state or a concurrent operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record is not in a state that allows the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The supplied data is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The code generator failed; the pipeline was left unchanged.
    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] agdp_generator::Error),

    /// Running the pipeline's artifacts failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The run was stopped by a cancellation request.
    #[error("Execution cancelled")]
    Cancelled,
}

impl Error {
    /// Creates an [`Error::ExecutionFailed`].
    pub fn execution_failed(cause: impl Into<String>) -> Self {
        Self::ExecutionFailed(cause.into())
    }

    /// Creates an [`Error::NotFound`] for a pipeline.
    pub fn pipeline_not_found(id: Uuid) -> Self {
        Self::NotFound {
            resource: "pipeline",
            id,
        }
    }

    /// Creates an [`Error::NotFound`] for an execution.
    pub fn execution_not_found(id: Uuid) -> Self {
        Self::NotFound {
            resource: "execution",
            id,
        }
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { resource, id } => Self::NotFound { resource, id },
            StoreError::Conflict(message) => Self::Conflict(message.into_owned()),
            StoreError::InvalidState(message) => Self::InvalidState(message.into_owned()),
            StoreError::Validation(message) => Self::Validation(message.into_owned()),
        }
    }
}
