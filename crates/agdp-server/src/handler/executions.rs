//! Execution handlers.
//!
//! Starting an execution returns immediately with a pending record; clients
//! poll the execution or its log until it reaches a terminal status.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use agdp_runtime::ExecutionEngine;
use agdp_store::types::TriggerType;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{ExecutionPathParams, LogsQuery, StartExecution};
use crate::handler::response::{ErrorResponse, Execution, ExecutionLogs};
use crate::service::ServiceState;

/// Tracing target for execution operations.
const TRACING_TARGET: &str = "agdp_server::handler::executions";

/// Starts a manual execution of a pipeline.
#[tracing::instrument(skip_all, fields(pipeline_id = %request.pipeline_id))]
async fn start_execution(
    State(engine): State<ExecutionEngine>,
    ValidateJson(request): ValidateJson<StartExecution>,
) -> Result<(StatusCode, Json<Execution>)> {
    tracing::debug!(target: TRACING_TARGET, "Starting execution");

    let execution = engine
        .start(request.pipeline_id, TriggerType::Manual)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        execution_id = %execution.id,
        "Execution started",
    );

    Ok((StatusCode::CREATED, Json(Execution::from_model(execution))))
}

fn start_execution_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Start execution")
        .description(
            "Queues an execution of a generated or scheduled pipeline and returns it in \
             pending status.",
        )
        .response::<201, Json<Execution>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Retrieves an execution with its full log.
#[tracing::instrument(skip_all, fields(execution_id = %path_params.execution_id))]
async fn read_execution(
    State(engine): State<ExecutionEngine>,
    Path(path_params): Path<ExecutionPathParams>,
) -> Result<(StatusCode, Json<Execution>)> {
    tracing::trace!(target: TRACING_TARGET, "Reading execution");

    let execution = engine.get(path_params.execution_id).await?;

    Ok((StatusCode::OK, Json(Execution::from_model(execution))))
}

fn read_execution_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get execution")
        .description("Returns execution status, output and the log collected so far.")
        .response::<200, Json<Execution>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Reads log entries starting at an index.
#[tracing::instrument(
    skip_all,
    fields(execution_id = %path_params.execution_id, since = query.since)
)]
async fn read_execution_logs(
    State(engine): State<ExecutionEngine>,
    Path(path_params): Path<ExecutionPathParams>,
    Query(query): Query<LogsQuery>,
) -> Result<(StatusCode, Json<ExecutionLogs>)> {
    tracing::trace!(target: TRACING_TARGET, "Reading execution logs");

    let logs = engine.logs(path_params.execution_id, query.since).await?;

    Ok((StatusCode::OK, Json(ExecutionLogs::from_model(logs))))
}

fn read_execution_logs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get execution logs")
        .description(
            "Returns log entries from index `since`. Pass the returned `next` as `since` to \
             read only new entries.",
        )
        .response::<200, Json<ExecutionLogs>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Cancels a pending or running execution.
#[tracing::instrument(skip_all, fields(execution_id = %path_params.execution_id))]
async fn cancel_execution(
    State(engine): State<ExecutionEngine>,
    Path(path_params): Path<ExecutionPathParams>,
) -> Result<(StatusCode, Json<Execution>)> {
    tracing::debug!(target: TRACING_TARGET, "Cancelling execution");

    let execution = engine.cancel(path_params.execution_id).await?;

    tracing::info!(
        target: TRACING_TARGET,
        status = %execution.status,
        "Execution cancel requested",
    );

    Ok((StatusCode::OK, Json(Execution::from_model(execution))))
}

fn cancel_execution_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Cancel execution")
        .description(
            "Stops a pending or running execution. Cancelling a finished execution returns \
             it unchanged.",
        )
        .response::<200, Json<Execution>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for pipeline executions.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api/executions",
            post_with(start_execution, start_execution_docs),
        )
        .api_route(
            "/api/executions/{executionId}",
            get_with(read_execution, read_execution_docs),
        )
        .api_route(
            "/api/executions/{executionId}/logs",
            get_with(read_execution_logs, read_execution_logs_docs),
        )
        .api_route(
            "/api/executions/{executionId}/cancel",
            post_with(cancel_execution, cancel_execution_docs),
        )
        .with_path_items(|item| item.tag("Executions"))
}
