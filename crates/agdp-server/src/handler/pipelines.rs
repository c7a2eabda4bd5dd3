//! Pipeline management handlers.
//!
//! Pipelines are created in draft status, turned into code artifacts by the
//! generate endpoint and then executed through the executions endpoints.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use agdp_runtime::{ExecutionEngine, GenerationService};
use agdp_store::Store;
use agdp_store::query::PipelineRepository;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::request::{
    CreatePipeline, Pagination, PipelinePathParams, UpdatePipeline as UpdatePipelineRequest,
};
use crate::handler::response::{
    ErrorResponse, Execution, Executions, Pipeline, PipelineSummaries, PipelineSummary,
};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for pipeline operations.
const TRACING_TARGET: &str = "agdp_server::handler::pipelines";

/// Creates a new pipeline in draft status.
#[tracing::instrument(skip_all)]
async fn create_pipeline(
    State(store): State<Store>,
    ValidateJson(request): ValidateJson<CreatePipeline>,
) -> Result<(StatusCode, Json<Pipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating pipeline");

    let pipeline = store.create_pipeline(request.into_model()).await?;

    tracing::info!(
        target: TRACING_TARGET,
        pipeline_id = %pipeline.id,
        features = pipeline.features.len(),
        "Pipeline created",
    );

    Ok((StatusCode::CREATED, Json(Pipeline::from_model(pipeline))))
}

fn create_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create pipeline")
        .description("Stores a prompt as a new draft pipeline. No code is generated yet.")
        .response::<201, Json<Pipeline>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Lists pipelines, newest first.
#[tracing::instrument(skip_all)]
async fn list_pipelines(
    State(store): State<Store>,
    Query(pagination): Query<Pagination>,
) -> Result<(StatusCode, Json<PipelineSummaries>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing pipelines");

    let pipelines = store.list_pipelines(pagination.into()).await?;
    let pipelines = PipelineSummary::from_models(pipelines);

    tracing::debug!(
        target: TRACING_TARGET,
        pipeline_count = pipelines.len(),
        "Pipelines listed",
    );

    Ok((StatusCode::OK, Json(pipelines)))
}

fn list_pipelines_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List pipelines")
        .description("Returns pipeline summaries, newest first. Artifacts are omitted.")
        .response::<200, Json<PipelineSummaries>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Retrieves a pipeline with its artifacts.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn read_pipeline(
    State(store): State<Store>,
    Path(path_params): Path<PipelinePathParams>,
) -> Result<(StatusCode, Json<Pipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Reading pipeline");

    let Some(pipeline) = store.find_pipeline_by_id(path_params.pipeline_id).await? else {
        return Err(ErrorKind::NotFound
            .with_message("Pipeline not found")
            .with_resource("pipeline"));
    };

    Ok((StatusCode::OK, Json(Pipeline::from_model(pipeline))))
}

fn read_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get pipeline")
        .description("Returns the pipeline including generated artifacts.")
        .response::<200, Json<Pipeline>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Updates a pipeline.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn update_pipeline(
    State(store): State<Store>,
    Path(path_params): Path<PipelinePathParams>,
    ValidateJson(request): ValidateJson<UpdatePipelineRequest>,
) -> Result<(StatusCode, Json<Pipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating pipeline");

    let pipeline = store
        .update_pipeline(path_params.pipeline_id, request.into_model())
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        status = %pipeline.status,
        revision = pipeline.revision,
        "Pipeline updated",
    );

    Ok((StatusCode::OK, Json(Pipeline::from_model(pipeline))))
}

fn update_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update pipeline")
        .description(
            "Changes name, description, prompt, features or schedule, or archives the \
             pipeline. Changing the prompt or features of a generated pipeline discards its \
             artifacts and returns it to draft.",
        )
        .response::<200, Json<Pipeline>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Deletes a pipeline and its executions.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn delete_pipeline(
    State(store): State<Store>,
    Path(path_params): Path<PipelinePathParams>,
) -> Result<StatusCode> {
    tracing::debug!(target: TRACING_TARGET, "Deleting pipeline");

    store.delete_pipeline(path_params.pipeline_id).await?;

    tracing::info!(target: TRACING_TARGET, "Pipeline deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn delete_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete pipeline")
        .description(
            "Permanently removes the pipeline and its execution history. Fails while an \
             execution is pending or running.",
        )
        .response::<204, ()>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Runs the code generator for a pipeline.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn generate_pipeline(
    State(generation): State<GenerationService>,
    Path(path_params): Path<PipelinePathParams>,
) -> Result<(StatusCode, Json<Pipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Generating pipeline artifacts");

    let pipeline = generation.generate(path_params.pipeline_id).await?;

    tracing::info!(
        target: TRACING_TARGET,
        artifacts = pipeline.artifacts.len(),
        generated_by = pipeline.generated_by.as_deref().unwrap_or_default(),
        "Pipeline artifacts generated",
    );

    Ok((StatusCode::OK, Json(Pipeline::from_model(pipeline))))
}

fn generate_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Generate pipeline code")
        .description(
            "Compiles the prompt into Python, SQL, Soda and Prefect artifacts depending on \
             the enabled features. On failure the pipeline is left unchanged.",
        )
        .response::<200, Json<Pipeline>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Lists executions of a pipeline, newest first.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn list_pipeline_executions(
    State(engine): State<ExecutionEngine>,
    Path(path_params): Path<PipelinePathParams>,
    Query(pagination): Query<Pagination>,
) -> Result<(StatusCode, Json<Executions>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing pipeline executions");

    let executions = engine
        .list_for_pipeline(path_params.pipeline_id, pagination.into())
        .await?;

    Ok((StatusCode::OK, Json(Execution::from_models(executions))))
}

fn list_pipeline_executions_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List pipeline executions")
        .description("Returns the executions of a pipeline, newest first.")
        .response::<200, Json<Executions>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for pipeline management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api/pipelines",
            post_with(create_pipeline, create_pipeline_docs)
                .get_with(list_pipelines, list_pipelines_docs),
        )
        .api_route(
            "/api/pipelines/{pipelineId}",
            get_with(read_pipeline, read_pipeline_docs)
                .put_with(update_pipeline, update_pipeline_docs)
                .delete_with(delete_pipeline, delete_pipeline_docs),
        )
        .api_route(
            "/api/pipelines/{pipelineId}/generate",
            post_with(generate_pipeline, generate_pipeline_docs),
        )
        .api_route(
            "/api/pipelines/{pipelineId}/executions",
            get_with(list_pipeline_executions, list_pipeline_executions_docs),
        )
        .with_path_items(|item| item.tag("Pipelines"))
}

#[cfg(test)]
mod tests {
    use agdp_store::types::PipelineStatus;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::handler::response::{Pipeline, PipelineSummary};
    use crate::handler::test::{create_generated_pipeline, create_pipeline, create_test_server};

    #[tokio::test]
    async fn create_returns_draft_without_artifacts() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let pipeline = create_pipeline(&server, &["duckdb"]).await;
        assert_eq!(pipeline.status, PipelineStatus::Draft);
        assert!(pipeline.artifacts.is_empty());
        assert_eq!(pipeline.revision, 0);
        assert!(pipeline.features.contains("duckdb"));
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_short_prompt() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/pipelines")
            .json(&json!({ "name": "tiny", "prompt": "too short" }))
            .expect_failure()
            .await;
        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["name"], "validation_error");
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_missing_prompt() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/pipelines")
            .json(&json!({ "name": "no prompt" }))
            .expect_failure()
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["name"], "validation_error");
        Ok(())
    }

    #[tokio::test]
    async fn read_unknown_pipeline_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .get(&format!("/api/pipelines/{}", Uuid::now_v7()))
            .expect_failure()
            .await;
        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["name"], "not_found");
        assert_eq!(body["resource"], "pipeline");
        Ok(())
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .get("/api/pipelines/not-a-uuid")
            .expect_failure()
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["name"], "bad_request");
        Ok(())
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let first = create_pipeline(&server, &[]).await;
        let second = create_pipeline(&server, &[]).await;

        let listed = server.get("/api/pipelines").await.json::<Vec<PipelineSummary>>();
        let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let page = server
            .get("/api/pipelines")
            .add_query_param("skip", 1)
            .add_query_param("limit", 1)
            .await
            .json::<Vec<PipelineSummary>>();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, first.id);
        Ok(())
    }

    #[tokio::test]
    async fn generate_produces_artifacts_per_feature() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let pipeline = create_generated_pipeline(&server, &["duckdb", "soda", "prefect"]).await;
        assert_eq!(pipeline.status, PipelineStatus::Generated);
        for target in ["python", "sql", "soda", "prefect"] {
            let source = pipeline.artifacts.get(target);
            assert!(source.is_some_and(|s| !s.trim().is_empty()), "{target}");
        }
        assert_eq!(pipeline.generated_by.as_deref(), Some("gpt-4"));
        assert!(pipeline.generated_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn generate_unknown_pipeline_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post(&format!("/api/pipelines/{}/generate", Uuid::now_v7()))
            .expect_failure()
            .await;
        response.assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn blank_name_is_validation_error() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/pipelines")
            .json(&json!({
                "name": "   ",
                "prompt": "Load daily sales and aggregate them per region",
            }))
            .expect_failure()
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["name"], "validation_error");

        let pipeline = create_pipeline(&server, &[]).await;
        let response = server
            .put(&format!("/api/pipelines/{}", pipeline.id))
            .json(&json!({ "name": " " }))
            .expect_failure()
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["name"], "validation_error");
        Ok(())
    }

    #[tokio::test]
    async fn rename_keeps_the_revision() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = create_pipeline(&server, &[]).await;

        let renamed = server
            .put(&format!("/api/pipelines/{}", pipeline.id))
            .json(&json!({ "name": "  nightly sales  " }))
            .await
            .json::<Pipeline>();
        assert_eq!(renamed.name, "nightly sales");
        assert_eq!(renamed.revision, pipeline.revision);
        Ok(())
    }

    #[tokio::test]
    async fn prompt_change_returns_to_draft() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = create_generated_pipeline(&server, &[]).await;

        let updated = server
            .put(&format!("/api/pipelines/{}", pipeline.id))
            .json(&json!({ "prompt": "Load weekly orders and compute churn by cohort" }))
            .await
            .json::<Pipeline>();
        assert_eq!(updated.status, PipelineStatus::Draft);
        assert!(updated.artifacts.is_empty());
        assert!(updated.revision > pipeline.revision);
        Ok(())
    }

    #[tokio::test]
    async fn schedule_moves_generated_to_scheduled() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = create_generated_pipeline(&server, &[]).await;
        let path = format!("/api/pipelines/{}", pipeline.id);

        let scheduled = server
            .put(&path)
            .json(&json!({ "schedule": "0 6 * * *" }))
            .await
            .json::<Pipeline>();
        assert_eq!(scheduled.status, PipelineStatus::Scheduled);
        assert!(scheduled.next_run_at.is_some());

        let cleared = server
            .put(&path)
            .json(&json!({ "schedule": null }))
            .await
            .json::<Pipeline>();
        assert_eq!(cleared.status, PipelineStatus::Generated);
        assert!(cleared.schedule.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn schedule_on_draft_is_invalid_state() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = create_pipeline(&server, &[]).await;

        let response = server
            .put(&format!("/api/pipelines/{}", pipeline.id))
            .json(&json!({ "schedule": "@daily" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["name"], "invalid_state");
        Ok(())
    }

    #[tokio::test]
    async fn malformed_cron_is_validation_error() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = create_generated_pipeline(&server, &[]).await;

        for schedule in ["every day at noon", "5/65535 * * * *"] {
            let response = server
                .put(&format!("/api/pipelines/{}", pipeline.id))
                .json(&json!({ "schedule": schedule }))
                .expect_failure()
                .await;
            response.assert_status_bad_request();
            assert_eq!(response.json::<Value>()["name"], "validation_error");
        }
        Ok(())
    }

    #[tokio::test]
    async fn archived_pipeline_rejects_edits() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = create_generated_pipeline(&server, &[]).await;
        let path = format!("/api/pipelines/{}", pipeline.id);

        let archived = server
            .put(&path)
            .json(&json!({ "archive": true }))
            .await
            .json::<Pipeline>();
        assert_eq!(archived.status, PipelineStatus::Archived);

        let response = server
            .put(&path)
            .json(&json!({ "name": "renamed" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["name"], "conflict");

        let response = server
            .post(&format!("{path}/generate"))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_pipeline() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = create_pipeline(&server, &[]).await;
        let path = format!("/api/pipelines/{}", pipeline.id);

        server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&path).expect_failure().await.assert_status_not_found();
        server.delete(&path).expect_failure().await.assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn executions_of_unknown_pipeline_are_not_found() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .get(&format!("/api/pipelines/{}/executions", Uuid::now_v7()))
            .expect_failure()
            .await;
        response.assert_status_not_found();
        Ok(())
    }
}
