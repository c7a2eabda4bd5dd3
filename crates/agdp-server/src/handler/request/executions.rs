//! Execution request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request payload for starting an execution.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartExecution {
    /// Pipeline to run. It must have generated artifacts.
    pub pipeline_id: Uuid,
}

/// Query parameters for reading an execution log.
#[must_use]
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    /// Index of the first entry to return; pass the previous `next` to tail.
    #[serde(default)]
    pub since: usize,
}
