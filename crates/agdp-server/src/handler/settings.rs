//! Settings handlers.
//!
//! Settings are process-wide and read by every generation and execution at
//! the moment it starts.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use agdp_store::Store;
use agdp_store::query::SettingsRepository;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::UpdateSettings;
use crate::handler::response::{ErrorResponse, Settings};
use crate::service::ServiceState;

/// Tracing target for settings operations.
const TRACING_TARGET: &str = "agdp_server::handler::settings";

/// Returns the current settings.
#[tracing::instrument(skip_all)]
async fn read_settings(State(store): State<Store>) -> Result<(StatusCode, Json<Settings>)> {
    tracing::debug!(target: TRACING_TARGET, "Reading settings");

    let settings = store.get_settings().await;

    Ok((StatusCode::OK, Json(Settings::from_model(settings))))
}

fn read_settings_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get settings")
        .description("Returns the current settings. The API key is reported only as present or absent.")
        .response::<200, Json<Settings>>()
}

/// Updates the settings.
#[tracing::instrument(skip_all)]
async fn update_settings(
    State(store): State<Store>,
    ValidateJson(request): ValidateJson<UpdateSettings>,
) -> Result<(StatusCode, Json<Settings>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating settings");

    let settings = store.update_settings(request.into_model()).await?;

    tracing::info!(
        target: TRACING_TARGET,
        llm_model = %settings.llm_model,
        llm_base_url = %settings.llm_base_url,
        has_llm_api_key = settings.has_llm_api_key(),
        "Settings updated",
    );

    Ok((StatusCode::OK, Json(Settings::from_model(settings))))
}

fn update_settings_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update settings")
        .description(
            "Replaces the given fields. Absent fields keep their value and an empty API key \
             removes the key. Unknown fields are rejected.",
        )
        .response::<200, Json<Settings>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns routes for settings management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api/settings",
            get_with(read_settings, read_settings_docs).put_with(update_settings, update_settings_docs),
        )
        .with_path_items(|item| item.tag("Settings"))
}
