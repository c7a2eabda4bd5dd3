//! Generation orchestration.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use agdp_generator::{GenerationRequest, GeneratorProvider};
use agdp_store::Store;
use agdp_store::model::Pipeline;
use agdp_store::query::{PipelineRepository, SettingsRepository};
use uuid::Uuid;

use crate::{Error, Result};

/// Tracing target for generation orchestration.
const TRACING_TARGET: &str = "agdp_runtime::generation";

/// Pipelines with a generation in progress.
type InFlight = Arc<Mutex<HashSet<Uuid>>>;

/// Runs the code generator for a pipeline and stores the result.
///
/// Guarantees at most one in-flight generation per pipeline and never
/// persists a partial artifact set.
#[derive(Clone)]
pub struct GenerationService {
    store: Store,
    provider: Arc<dyn GeneratorProvider>,
    in_flight: InFlight,
}

impl fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationService")
            .field("in_flight", &self.in_flight_count())
            .finish_non_exhaustive()
    }
}

/// Releases the pipeline's in-flight slot when dropped.
struct InFlightGuard {
    in_flight: InFlight,
    pipeline_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.pipeline_id);
    }
}

impl GenerationService {
    /// Creates a new generation service.
    pub fn new<P>(store: Store, provider: P) -> Self
    where
        P: GeneratorProvider + 'static,
    {
        Self {
            store,
            provider: Arc::new(provider),
            in_flight: InFlight::default(),
        }
    }

    /// Returns the number of generations currently in progress.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Generates artifacts for a pipeline.
    ///
    /// Moves a draft pipeline to generated; a generated or scheduled
    /// pipeline keeps its status and gets fresh artifacts. On failure the
    /// pipeline is left exactly as it was.
    pub async fn generate(&self, pipeline_id: Uuid) -> Result<Pipeline> {
        let _guard = self.begin(pipeline_id)?;

        let pipeline = self
            .store
            .find_pipeline_by_id(pipeline_id)
            .await?
            .ok_or_else(|| Error::pipeline_not_found(pipeline_id))?;
        if pipeline.is_archived() {
            return Err(Error::Conflict(
                "archived pipelines cannot be regenerated".to_owned(),
            ));
        }

        let settings = self.store.get_settings().await;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_id = %pipeline_id,
            revision = pipeline.revision,
            llm_model = %settings.llm_model,
            "Generation started",
        );

        let request = GenerationRequest::from_pipeline(&pipeline, &settings)?;
        let generator = self.provider.resolve(&settings)?;
        let artifacts = generator.generate(&request).await?;

        let updated = self
            .store
            .store_pipeline_artifacts(
                pipeline_id,
                pipeline.revision,
                artifacts,
                settings.llm_model.clone(),
            )
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_id = %pipeline_id,
            generator = generator.name(),
            status = %updated.status,
            artifacts = updated.artifacts.len(),
            "Generation completed",
        );

        Ok(updated)
    }

    /// Claims the in-flight slot for a pipeline.
    fn begin(&self, pipeline_id: Uuid) -> Result<InFlightGuard> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !in_flight.insert(pipeline_id) {
            tracing::debug!(
                target: TRACING_TARGET,
                pipeline_id = %pipeline_id,
                "Generation already in progress",
            );
            return Err(Error::Conflict(
                "a generation is already in progress for this pipeline".to_owned(),
            ));
        }

        Ok(InFlightGuard {
            in_flight: self.in_flight.clone(),
            pipeline_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use agdp_generator::template::TemplateGenerator;
    use agdp_generator::{CodeGenerator, ErrorKind, GeneratorService};
    use agdp_store::model::{Artifacts, NewPipeline, UpdatePipeline};
    use agdp_store::types::PipelineStatus;
    use tokio::sync::Notify;

    use super::*;

    /// Generator that waits for a signal before answering.
    struct GatedGenerator {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl CodeGenerator for GatedGenerator {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn generate(&self, request: &GenerationRequest) -> agdp_generator::Result<Artifacts> {
            self.started.notify_one();
            self.release.notified().await;
            TemplateGenerator::new().generate(request).await
        }
    }

    struct FailingGenerator;

    #[async_trait::async_trait]
    impl CodeGenerator for FailingGenerator {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn generate(&self, _: &GenerationRequest) -> agdp_generator::Result<Artifacts> {
            Err(agdp_generator::Error::new(ErrorKind::ServiceUnavailable)
                .with_message("model endpoint returned 503"))
        }
    }

    async fn draft(store: &Store, features: &[&str]) -> Result<Pipeline> {
        let pipeline = store
            .create_pipeline(NewPipeline {
                name: "sales".into(),
                prompt: "daily sales ETL".into(),
                features: features.iter().map(|f| (*f).to_owned()).collect(),
                ..Default::default()
            })
            .await?;
        Ok(pipeline)
    }

    #[tokio::test]
    async fn generates_every_configured_target() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = draft(&store, &["duckdb", "soda", "prefect"]).await?;
        let service = GenerationService::new(
            store.clone(),
            GeneratorService::new(TemplateGenerator::new()),
        );

        let generated = service.generate(pipeline.id).await?;
        assert_eq!(generated.status, PipelineStatus::Generated);
        assert_eq!(generated.artifacts.len(), 4);
        assert!(generated.artifacts.values().all(|source| !source.is_empty()));
        assert_eq!(generated.generated_by.as_deref(), Some("gpt-4"));
        assert_eq!(service.in_flight_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn failure_leaves_pipeline_in_draft() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = draft(&store, &[]).await?;
        let service = GenerationService::new(store.clone(), GeneratorService::new(FailingGenerator));

        let result = service.generate(pipeline.id).await;
        assert!(matches!(result, Err(Error::GenerationFailed(_))));

        let unchanged = store.find_pipeline_by_id(pipeline.id).await?;
        assert_eq!(unchanged, Some(pipeline));
        assert_eq!(service.in_flight_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_generation_conflicts() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = draft(&store, &[]).await?;
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let generator = GatedGenerator {
            started: started.clone(),
            release: release.clone(),
        };
        let service = GenerationService::new(store.clone(), GeneratorService::new(generator));

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.generate(pipeline.id).await }
        });
        started.notified().await;

        let second = service.generate(pipeline.id).await;
        assert!(matches!(second, Err(Error::Conflict(_))));

        release.notify_one();
        let generated = first.await??;
        assert_eq!(generated.status, PipelineStatus::Generated);
        Ok(())
    }

    #[tokio::test]
    async fn edit_during_generation_wins() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = draft(&store, &[]).await?;
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let generator = GatedGenerator {
            started: started.clone(),
            release: release.clone(),
        };
        let service = GenerationService::new(store.clone(), GeneratorService::new(generator));

        let pending = tokio::spawn({
            let service = service.clone();
            async move { service.generate(pipeline.id).await }
        });
        started.notified().await;

        let edit = UpdatePipeline {
            prompt: Some("hourly inventory sync".into()),
            ..Default::default()
        };
        store.update_pipeline(pipeline.id, edit).await?;
        release.notify_one();

        let result = tokio::time::timeout(Duration::from_secs(5), pending).await??;
        assert!(matches!(result, Err(Error::Conflict(_))));

        let current = store.find_pipeline_by_id(pipeline.id).await?;
        assert!(current.is_some_and(|p| p.status.is_draft() && p.artifacts.is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_pipeline_is_not_found() -> anyhow::Result<()> {
        let service = GenerationService::new(
            Store::default(),
            GeneratorService::new(TemplateGenerator::new()),
        );
        let result = service.generate(Uuid::now_v7()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
