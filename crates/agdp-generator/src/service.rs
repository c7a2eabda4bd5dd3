//! Generator service wrapper with observability and output validation.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use agdp_store::model::Artifacts;

use crate::{CodeGenerator, Error, ErrorKind, GenerationRequest, Result, TRACING_TARGET};

/// Generator service wrapper.
///
/// Adds structured logging to any [`CodeGenerator`] and enforces the
/// all-or-nothing contract: the returned artifacts contain exactly the
/// request's targets, each non-empty. The inner generator is wrapped in
/// `Arc` for cheap cloning.
#[derive(Clone)]
pub struct GeneratorService {
    inner: Arc<dyn CodeGenerator>,
}

impl fmt::Debug for GeneratorService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorService")
            .field("generator", &self.inner.name())
            .finish_non_exhaustive()
    }
}

impl GeneratorService {
    /// Creates a new generator service wrapper.
    pub fn new<G>(generator: G) -> Self
    where
        G: CodeGenerator + 'static,
    {
        Self {
            inner: Arc::new(generator),
        }
    }

    /// Returns the name of the wrapped generator.
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Generates and validates the artifacts for a request.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Artifacts> {
        let started_at = Instant::now();
        let targets = request.targets();

        tracing::debug!(
            target: TRACING_TARGET,
            generator = self.name(),
            model = %request.model,
            targets = targets.len(),
            "Generating artifacts",
        );

        let result = self
            .inner
            .generate(request)
            .await
            .and_then(|artifacts| validate(request, artifacts));
        let elapsed = started_at.elapsed();

        match &result {
            Ok(artifacts) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    generator = self.name(),
                    model = %request.model,
                    artifacts = artifacts.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Artifacts generated",
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    generator = self.name(),
                    model = %request.model,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Artifact generation failed",
                );
            }
        }

        result
    }
}

/// Keeps exactly the requested targets and rejects missing or empty ones.
fn validate(request: &GenerationRequest, mut artifacts: Artifacts) -> Result<Artifacts> {
    let mut validated = Artifacts::new();
    for target in request.targets() {
        let source = artifacts
            .remove(target.as_ref())
            .filter(|source| !source.trim().is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::IncompleteOutput)
                    .with_message(format!("Generator produced no {target} artifact"))
            })?;
        validated.insert(target.to_string(), source);
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use agdp_store::model::Features;

    use super::*;

    struct FixedGenerator(Artifacts);

    #[async_trait::async_trait]
    impl CodeGenerator for FixedGenerator {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<Artifacts> {
            Ok(self.0.clone())
        }
    }

    fn request(flags: &[&str]) -> Result<GenerationRequest> {
        let features: Features = flags.iter().map(|f| (*f).to_owned()).collect();
        GenerationRequest::new("daily sales ETL", features, "gpt-4")
    }

    #[tokio::test]
    async fn missing_target_is_incomplete() -> Result<()> {
        let artifacts: Artifacts = [("python".to_owned(), "print(1)".to_owned())].into();
        let service = GeneratorService::new(FixedGenerator(artifacts));

        let error = service.generate(&request(&["duckdb"])?).await;
        assert!(error.is_err_and(|e| e.kind == ErrorKind::IncompleteOutput));
        Ok(())
    }

    #[tokio::test]
    async fn empty_target_is_incomplete() -> Result<()> {
        let artifacts: Artifacts = [("python".to_owned(), "\n ".to_owned())].into();
        let service = GeneratorService::new(FixedGenerator(artifacts));

        let error = service.generate(&request(&[])?).await;
        assert!(error.is_err_and(|e| e.kind == ErrorKind::IncompleteOutput));
        Ok(())
    }

    #[tokio::test]
    async fn extra_targets_are_dropped() -> Result<()> {
        let artifacts: Artifacts = [
            ("python".to_owned(), "print(1)".to_owned()),
            ("notes".to_owned(), "ignored".to_owned()),
        ]
        .into();
        let service = GeneratorService::new(FixedGenerator(artifacts));

        let artifacts = service.generate(&request(&[])?).await?;
        assert_eq!(artifacts.keys().collect::<Vec<_>>(), vec!["python"]);
        Ok(())
    }
}
