//! Store error to HTTP error conversion.

use agdp_store::StoreError;

use crate::handler::{Error, ErrorKind};

/// Tracing target for store error conversion.
const TRACING_TARGET: &str = "agdp_server::handler::store_error";

impl From<StoreError> for Error<'static> {
    fn from(error: StoreError) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            error = %error,
            "store operation rejected",
        );

        match error {
            StoreError::NotFound { resource, id } => ErrorKind::NotFound
                .with_message(format!("No {resource} with id {id}"))
                .with_resource(resource),
            StoreError::Conflict(message) => ErrorKind::Conflict.with_message(message),
            StoreError::InvalidState(message) => ErrorKind::InvalidState.with_message(message),
            StoreError::Validation(message) => ErrorKind::ValidationError.with_message(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn store_errors_keep_their_class() {
        let error = Error::from(StoreError::pipeline_not_found(Uuid::nil()));
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.resource(), Some("pipeline"));

        let error = Error::from(StoreError::conflict("pipeline is archived"));
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(error.message(), Some("pipeline is archived"));

        let error = Error::from(StoreError::invalid_state("pipeline is a draft"));
        assert_eq!(error.kind(), ErrorKind::InvalidState);

        let error = Error::from(StoreError::validation("llmModel must not be empty"));
        assert_eq!(error.kind(), ErrorKind::ValidationError);
    }
}
