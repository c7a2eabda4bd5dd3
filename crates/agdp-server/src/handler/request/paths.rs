//! Path parameter types for HTTP handlers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path parameters for pipeline operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePathParams {
    /// Unique identifier of the pipeline.
    pub pipeline_id: Uuid,
}

/// Path parameters for execution operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPathParams {
    /// Unique identifier of the execution.
    pub execution_id: Uuid,
}
