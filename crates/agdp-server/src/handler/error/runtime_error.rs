//! Runtime and generator error to HTTP error conversion.

use crate::handler::{Error, ErrorKind};

/// Tracing target for runtime error conversion.
const TRACING_TARGET: &str = "agdp_server::handler::runtime_error";

impl From<agdp_generator::Error> for Error<'static> {
    fn from(error: agdp_generator::Error) -> Self {
        tracing::warn!(
            target: TRACING_TARGET,
            kind = %error.kind,
            error = %error,
            transient = error.is_transient(),
            "code generation failed",
        );

        ErrorKind::GenerationFailed
            .with_message(error.cause().into_owned())
            .with_resource("pipeline")
            .with_context(error.kind.to_string())
    }
}

impl From<agdp_runtime::Error> for Error<'static> {
    fn from(error: agdp_runtime::Error) -> Self {
        use agdp_runtime::Error as RuntimeError;

        match error {
            RuntimeError::NotFound { resource, id } => ErrorKind::NotFound
                .with_message(format!("No {resource} with id {id}"))
                .with_resource(resource),
            RuntimeError::Conflict(message) => ErrorKind::Conflict.with_message(message),
            RuntimeError::InvalidState(message) => ErrorKind::InvalidState.with_message(message),
            RuntimeError::Validation(message) => ErrorKind::ValidationError.with_message(message),
            RuntimeError::GenerationFailed(source) => source.into(),
            RuntimeError::ExecutionFailed(cause) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %cause,
                    "execution failed",
                );
                ErrorKind::ExecutionFailed
                    .with_message(cause)
                    .with_resource("execution")
            }
            RuntimeError::Cancelled => ErrorKind::Conflict
                .with_message("The execution was cancelled")
                .with_resource("execution"),
        }
    }
}

#[cfg(test)]
mod tests {
    use agdp_generator::ErrorKind as GeneratorErrorKind;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn generator_failure_is_bad_gateway() {
        let source = agdp_generator::Error::new(GeneratorErrorKind::Authentication)
            .with_message("The completion API rejected the API key");
        let error = Error::from(agdp_runtime::Error::from(source));

        assert_eq!(error.kind(), ErrorKind::GenerationFailed);
        assert_eq!(error.kind().status_code().as_u16(), 502);
        assert_eq!(
            error.message(),
            Some("The completion API rejected the API key")
        );
    }

    #[test]
    fn runtime_not_found_names_resource() {
        let error = Error::from(agdp_runtime::Error::execution_not_found(Uuid::nil()));
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.resource(), Some("execution"));
    }

    #[test]
    fn runtime_invalid_state_is_conflict_status() {
        let error = Error::from(agdp_runtime::Error::InvalidState(
            "pipeline is a draft".to_owned(),
        ));
        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert_eq!(error.kind().status_code().as_u16(), 409);
    }
}
