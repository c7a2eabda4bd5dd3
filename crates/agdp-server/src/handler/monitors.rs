//! Liveness and health handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use agdp_runtime::GenerationService;
use agdp_store::Store;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::{Health, Liveness};
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "agdp_server::handler::monitors";

/// Returns a static liveness message.
async fn liveness() -> Json<Liveness> {
    Json(Liveness::default())
}

fn liveness_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Liveness")
        .description("Returns `ok` while the server accepts requests.")
        .response::<200, Json<Liveness>>()
}

/// Returns record counts and in-flight work.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(store): State<Store>,
    State(generation): State<GenerationService>,
) -> Result<(StatusCode, Json<Health>)> {
    let health = Health::new(store.status().await, generation.in_flight_count());

    tracing::debug!(
        target: TRACING_TARGET,
        pipelines = health.pipelines,
        active_executions = health.active_executions,
        running_generations = health.running_generations,
        "Health status response prepared"
    );

    Ok((StatusCode::OK, Json(health)))
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Health")
        .description("Returns the version, stored record counts and work in progress.")
        .response::<200, Json<Health>>()
}

/// Returns routes for health monitoring.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/", get_with(liveness, liveness_docs))
        .api_route("/health", get_with(health_status, health_status_docs))
        .with_path_items(|item| item.tag("Monitors"))
}
