//! Execution response types.

use agdp_runtime::ExecutionLogs as ExecutionLogsModel;
use agdp_store::model::{self, LogEntry};
use agdp_store::types::{ExecutionStatus, TriggerType};
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Execution status with its full log.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Unique execution identifier.
    pub id: Uuid,
    /// Pipeline that was run.
    pub pipeline_id: Uuid,
    /// What started the execution.
    pub trigger: TriggerType,
    /// Current status.
    pub status: ExecutionStatus,
    /// Log entries recorded so far, oldest first.
    pub logs: Vec<LogEntry>,
    /// Output preview, once the execution has finished.
    pub output: Option<String>,
    /// Failure or cancellation cause.
    pub error: Option<String>,
    /// Timestamp when the execution was created.
    pub started_at: Timestamp,
    /// Timestamp when the runner picked the execution up.
    pub running_at: Option<Timestamp>,
    /// Timestamp when the execution reached a terminal status.
    pub finished_at: Option<Timestamp>,
}

impl Execution {
    /// Creates an Execution response from a store model.
    pub fn from_model(execution: model::Execution) -> Self {
        Self {
            id: execution.id,
            pipeline_id: execution.pipeline_id,
            trigger: execution.trigger,
            status: execution.status,
            logs: execution.logs,
            output: execution.output,
            error: execution.error,
            started_at: execution.started_at,
            running_at: execution.running_at,
            finished_at: execution.finished_at,
        }
    }

    /// Creates a list of Execution responses from store models.
    pub fn from_models(models: Vec<model::Execution>) -> Vec<Self> {
        models.into_iter().map(Self::from_model).collect()
    }
}

/// Response for listing executions.
pub type Executions = Vec<Execution>;

/// A slice of an execution log.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogs {
    /// Execution the entries belong to.
    pub execution_id: Uuid,
    /// Status at the time of the read.
    pub status: ExecutionStatus,
    /// Index of the first returned entry.
    pub since: usize,
    /// Index to pass as `since` on the next read.
    pub next: usize,
    /// Entries starting at `since`.
    pub entries: Vec<LogEntry>,
}

impl ExecutionLogs {
    /// Creates a log slice response from the engine's view.
    pub fn from_model(logs: ExecutionLogsModel) -> Self {
        Self {
            execution_id: logs.execution_id,
            status: logs.status,
            since: logs.since,
            next: logs.next,
            entries: logs.entries,
        }
    }
}
