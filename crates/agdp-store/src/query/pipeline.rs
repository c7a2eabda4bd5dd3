//! Pipeline repository.

use std::future::Future;

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{Artifacts, NewPipeline, Pipeline, UpdatePipeline};
use crate::types::{OffsetPagination, PipelineStatus};
use crate::{Store, StoreError, StoreResult, TRACING_TARGET_QUERY};

/// Repository for pipeline operations.
///
/// Handles the pipeline lifecycle: creation, edits, artifact storage after a
/// generation, scheduling, archiving and deletion.
pub trait PipelineRepository {
    /// Creates a new pipeline in draft status with no artifacts.
    fn create_pipeline(
        &self,
        new_pipeline: NewPipeline,
    ) -> impl Future<Output = StoreResult<Pipeline>> + Send;

    /// Finds a pipeline by its unique identifier.
    fn find_pipeline_by_id(
        &self,
        pipeline_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Pipeline>>> + Send;

    /// Lists pipelines, newest first.
    fn list_pipelines(
        &self,
        pagination: OffsetPagination,
    ) -> impl Future<Output = StoreResult<Vec<Pipeline>>> + Send;

    /// Lists pipelines in scheduled status.
    fn list_scheduled_pipelines(&self) -> impl Future<Output = StoreResult<Vec<Pipeline>>> + Send;

    /// Updates a pipeline.
    ///
    /// Fails with [`StoreError::Conflict`] when the pipeline is archived or
    /// when the generation inputs of a scheduled pipeline are changed.
    fn update_pipeline(
        &self,
        pipeline_id: Uuid,
        updates: UpdatePipeline,
    ) -> impl Future<Output = StoreResult<Pipeline>> + Send;

    /// Stores the artifacts of a successful generation.
    ///
    /// The write only happens if the pipeline is still at `expected_revision`,
    /// so an edit made while the generator was running is never overwritten.
    fn store_pipeline_artifacts(
        &self,
        pipeline_id: Uuid,
        expected_revision: u64,
        artifacts: Artifacts,
        generated_by: String,
    ) -> impl Future<Output = StoreResult<Pipeline>> + Send;

    /// Deletes a pipeline together with its executions.
    fn delete_pipeline(&self, pipeline_id: Uuid) -> impl Future<Output = StoreResult<()>> + Send;
}

impl PipelineRepository for Store {
    async fn create_pipeline(&self, new_pipeline: NewPipeline) -> StoreResult<Pipeline> {
        let now = Timestamp::now();
        let pipeline = Pipeline {
            id: Uuid::now_v7(),
            name: new_pipeline.name,
            description: new_pipeline.description,
            prompt: new_pipeline.prompt,
            features: new_pipeline.features,
            artifacts: Artifacts::new(),
            schedule: None,
            status: PipelineStatus::Draft,
            generated_by: None,
            revision: 0,
            created_at: now,
            updated_at: now,
            generated_at: None,
        };

        let mut tables = self.tables().write().await;
        tables.pipelines.insert(pipeline.id, pipeline.clone());

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            pipeline_id = %pipeline.id,
            "Pipeline created",
        );

        Ok(pipeline)
    }

    async fn find_pipeline_by_id(&self, pipeline_id: Uuid) -> StoreResult<Option<Pipeline>> {
        let tables = self.tables().read().await;
        Ok(tables.pipelines.get(&pipeline_id).cloned())
    }

    async fn list_pipelines(&self, pagination: OffsetPagination) -> StoreResult<Vec<Pipeline>> {
        let tables = self.tables().read().await;
        let mut pipelines: Vec<&Pipeline> = tables.pipelines.values().collect();
        pipelines.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(pagination.apply(pipelines.into_iter().cloned()))
    }

    async fn list_scheduled_pipelines(&self) -> StoreResult<Vec<Pipeline>> {
        let tables = self.tables().read().await;
        let pipelines = tables
            .pipelines
            .values()
            .filter(|pipeline| pipeline.status.is_scheduled())
            .cloned()
            .collect();

        Ok(pipelines)
    }

    async fn update_pipeline(
        &self,
        pipeline_id: Uuid,
        updates: UpdatePipeline,
    ) -> StoreResult<Pipeline> {
        let mut tables = self.tables().write().await;
        let current = tables
            .pipelines
            .get(&pipeline_id)
            .ok_or_else(|| StoreError::pipeline_not_found(pipeline_id))?;

        let updated = apply_update(current, updates)?;
        tables.pipelines.insert(pipeline_id, updated.clone());

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            pipeline_id = %pipeline_id,
            status = %updated.status,
            revision = updated.revision,
            "Pipeline updated",
        );

        Ok(updated)
    }

    async fn store_pipeline_artifacts(
        &self,
        pipeline_id: Uuid,
        expected_revision: u64,
        artifacts: Artifacts,
        generated_by: String,
    ) -> StoreResult<Pipeline> {
        if artifacts.is_empty() || artifacts.values().any(|source| source.trim().is_empty()) {
            return Err(StoreError::validation(
                "generated artifacts must not be empty",
            ));
        }

        let mut tables = self.tables().write().await;
        let pipeline = tables
            .pipelines
            .get_mut(&pipeline_id)
            .ok_or_else(|| StoreError::pipeline_not_found(pipeline_id))?;

        if pipeline.is_archived() {
            return Err(StoreError::conflict("pipeline was archived during generation"));
        }
        if pipeline.revision != expected_revision {
            return Err(StoreError::conflict("pipeline was modified during generation"));
        }

        let now = Timestamp::now();
        pipeline.artifacts = artifacts;
        pipeline.generated_by = Some(generated_by);
        pipeline.generated_at = Some(now);
        pipeline.updated_at = now;
        pipeline.revision += 1;
        if pipeline.status.is_draft() {
            pipeline.status = PipelineStatus::Generated;
        }

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            pipeline_id = %pipeline_id,
            artifacts = pipeline.artifacts.len(),
            "Pipeline artifacts stored",
        );

        Ok(pipeline.clone())
    }

    async fn delete_pipeline(&self, pipeline_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables().write().await;
        if !tables.pipelines.contains_key(&pipeline_id) {
            return Err(StoreError::pipeline_not_found(pipeline_id));
        }

        let has_active = tables
            .executions
            .values()
            .any(|execution| execution.pipeline_id == pipeline_id && execution.status.is_active());
        if has_active {
            return Err(StoreError::conflict(
                "pipeline has an active execution; cancel it before deleting",
            ));
        }

        tables.pipelines.remove(&pipeline_id);
        let before = tables.executions.len();
        tables
            .executions
            .retain(|_, execution| execution.pipeline_id != pipeline_id);

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            pipeline_id = %pipeline_id,
            executions_removed = before - tables.executions.len(),
            "Pipeline deleted",
        );

        Ok(())
    }
}

/// Applies `updates` to a copy of `current` following the lifecycle rules.
fn apply_update(current: &Pipeline, updates: UpdatePipeline) -> StoreResult<Pipeline> {
    if current.is_archived() {
        return Err(StoreError::conflict("archived pipelines cannot be modified"));
    }

    let mut next = current.clone();

    if let Some(name) = updates.name {
        next.name = name;
    }
    if let Some(description) = updates.description {
        next.description = description;
    }

    let prompt_changed = updates
        .prompt
        .as_ref()
        .is_some_and(|prompt| *prompt != current.prompt);
    let features_changed = updates
        .features
        .as_ref()
        .is_some_and(|features| *features != current.features);

    if prompt_changed || features_changed {
        if current.status.is_scheduled() {
            return Err(StoreError::conflict(
                "remove the schedule before changing the prompt or features",
            ));
        }
        if let Some(prompt) = updates.prompt {
            next.prompt = prompt;
        }
        if let Some(features) = updates.features {
            next.features = features;
        }
        next.artifacts.clear();
        next.generated_by = None;
        next.generated_at = None;
        next.status = PipelineStatus::Draft;
    }

    match updates.schedule {
        Some(Some(schedule)) => {
            if !next.is_executable() {
                return Err(StoreError::invalid_state(
                    "pipeline must be generated before it can be scheduled",
                ));
            }
            next.schedule = Some(schedule);
            next.status = PipelineStatus::Scheduled;
        }
        Some(None) => {
            next.schedule = None;
            if next.status.is_scheduled() {
                next.status = PipelineStatus::Generated;
            }
        }
        None => {}
    }

    if updates.archive {
        if !next.is_executable() {
            return Err(StoreError::invalid_state(
                "only generated or scheduled pipelines can be archived",
            ));
        }
        next.status = PipelineStatus::Archived;
    }

    if prompt_changed || features_changed || updates.archive {
        next.revision += 1;
    }
    next.updated_at = Timestamp::now();
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExecutionOutcome, NewExecution};
    use crate::query::ExecutionRepository;
    use crate::types::CronSchedule;

    fn new_pipeline(name: &str) -> NewPipeline {
        NewPipeline {
            name: name.to_owned(),
            description: None,
            prompt: "daily sales ETL".to_owned(),
            features: ["duckdb".to_owned()].into(),
        }
    }

    fn artifacts() -> Artifacts {
        [("python".to_owned(), "print('ok')".to_owned())].into()
    }

    async fn generated(store: &Store) -> StoreResult<Pipeline> {
        let pipeline = store.create_pipeline(new_pipeline("sales")).await?;
        store
            .store_pipeline_artifacts(pipeline.id, pipeline.revision, artifacts(), "gpt-4".into())
            .await
    }

    #[tokio::test]
    async fn create_starts_in_draft() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = store.create_pipeline(new_pipeline("sales")).await?;

        assert_eq!(pipeline.status, PipelineStatus::Draft);
        assert!(pipeline.artifacts.is_empty());
        assert!(pipeline.schedule.is_none());

        let found = store.find_pipeline_by_id(pipeline.id).await?;
        assert_eq!(found, Some(pipeline));
        Ok(())
    }

    #[tokio::test]
    async fn list_is_newest_first() -> StoreResult<()> {
        let store = Store::default();
        let first = store.create_pipeline(new_pipeline("first")).await?;
        let second = store.create_pipeline(new_pipeline("second")).await?;

        let listed = store.list_pipelines(OffsetPagination::default()).await?;
        let ids: Vec<Uuid> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let page = store.list_pipelines(OffsetPagination::new(1, 1)).await?;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, first.id);
        Ok(())
    }

    #[tokio::test]
    async fn artifacts_move_draft_to_generated() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = generated(&store).await?;

        assert_eq!(pipeline.status, PipelineStatus::Generated);
        assert!(pipeline.has_artifacts());
        assert_eq!(pipeline.generated_by.as_deref(), Some("gpt-4"));
        assert!(pipeline.generated_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = store.create_pipeline(new_pipeline("sales")).await?;
        let edit = UpdatePipeline {
            prompt: Some("hourly inventory sync".into()),
            ..Default::default()
        };
        store.update_pipeline(pipeline.id, edit).await?;

        let result = store
            .store_pipeline_artifacts(pipeline.id, pipeline.revision, artifacts(), "gpt-4".into())
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let unchanged = store.find_pipeline_by_id(pipeline.id).await?;
        assert!(unchanged.is_some_and(|p| p.artifacts.is_empty() && p.status.is_draft()));
        Ok(())
    }

    #[tokio::test]
    async fn rename_keeps_the_revision() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = store.create_pipeline(new_pipeline("sales")).await?;
        let rename = UpdatePipeline {
            name: Some("renamed".into()),
            description: Some(Some("nightly sales rollup".into())),
            ..Default::default()
        };
        let renamed = store.update_pipeline(pipeline.id, rename).await?;
        assert_eq!(renamed.revision, pipeline.revision);

        let stored = store
            .store_pipeline_artifacts(pipeline.id, pipeline.revision, artifacts(), "gpt-4".into())
            .await?;
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.status, PipelineStatus::Generated);
        Ok(())
    }

    #[tokio::test]
    async fn empty_artifacts_are_rejected() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = store.create_pipeline(new_pipeline("sales")).await?;
        let blank: Artifacts = [("python".to_owned(), "  ".to_owned())].into();

        let result = store
            .store_pipeline_artifacts(pipeline.id, pipeline.revision, blank, "gpt-4".into())
            .await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn prompt_change_resets_to_draft() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = generated(&store).await?;

        let updates = UpdatePipeline {
            prompt: Some("hourly inventory sync".into()),
            ..Default::default()
        };
        let updated = store.update_pipeline(pipeline.id, updates).await?;

        assert_eq!(updated.status, PipelineStatus::Draft);
        assert!(updated.artifacts.is_empty());
        assert!(updated.generated_by.is_none());
        assert!(updated.revision > pipeline.revision);
        Ok(())
    }

    #[tokio::test]
    async fn schedule_requires_generated() -> StoreResult<()> {
        let store = Store::default();
        let draft = store.create_pipeline(new_pipeline("sales")).await?;
        let schedule = CronSchedule::parse("0 6 * * *").ok();

        let updates = UpdatePipeline {
            schedule: Some(schedule.clone()),
            ..Default::default()
        };
        let result = store.update_pipeline(draft.id, updates).await;
        assert!(matches!(result, Err(StoreError::InvalidState(_))));

        let pipeline = generated(&store).await?;
        let updates = UpdatePipeline {
            schedule: Some(schedule),
            ..Default::default()
        };
        let scheduled = store.update_pipeline(pipeline.id, updates).await?;
        assert_eq!(scheduled.status, PipelineStatus::Scheduled);

        let listed = store.list_scheduled_pipelines().await?;
        assert_eq!(listed.len(), 1);

        let conflicting = UpdatePipeline {
            prompt: Some("something else entirely".into()),
            ..Default::default()
        };
        let result = store.update_pipeline(pipeline.id, conflicting).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let clear = UpdatePipeline {
            schedule: Some(None),
            ..Default::default()
        };
        let cleared = store.update_pipeline(pipeline.id, clear).await?;
        assert_eq!(cleared.status, PipelineStatus::Generated);
        assert!(cleared.schedule.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn archived_pipeline_is_immutable() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = generated(&store).await?;

        let archive = UpdatePipeline {
            archive: true,
            ..Default::default()
        };
        let archived = store.update_pipeline(pipeline.id, archive).await?;
        assert!(archived.is_archived());

        let rename = UpdatePipeline {
            name: Some("renamed".into()),
            ..Default::default()
        };
        let result = store.update_pipeline(pipeline.id, rename).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn archiving_draft_is_invalid() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = store.create_pipeline(new_pipeline("sales")).await?;
        let archive = UpdatePipeline {
            archive: true,
            ..Default::default()
        };
        let result = store.update_pipeline(pipeline.id, archive).await;
        assert!(matches!(result, Err(StoreError::InvalidState(_))));
        Ok(())
    }

    #[tokio::test]
    async fn delete_cascades_to_executions() -> StoreResult<()> {
        let store = Store::default();
        let pipeline = generated(&store).await?;
        let execution = store
            .create_execution(NewExecution::manual(pipeline.id))
            .await?;

        let result = store.delete_pipeline(pipeline.id).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        store
            .finish_execution(execution.id, ExecutionOutcome::Cancelled("test".into()))
            .await?;
        store.delete_pipeline(pipeline.id).await?;

        assert!(store.find_pipeline_by_id(pipeline.id).await?.is_none());
        assert!(store.find_execution_by_id(execution.id).await?.is_none());

        let missing = store.delete_pipeline(pipeline.id).await;
        assert!(missing.is_err_and(|e| e.is_not_found()));
        Ok(())
    }
}
