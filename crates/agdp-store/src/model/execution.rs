//! Execution model.

use jiff::Timestamp;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ExecutionStatus, LogLevel, TriggerType};

/// One line of an execution log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// When the line was recorded.
    pub timestamp: Timestamp,
    /// Severity of the line.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

impl LogEntry {
    /// Creates a log entry stamped with the current time.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Timestamp::now(),
            level,
            message: message.into(),
        }
    }

    /// Creates an `info` entry.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Creates a `warning` entry.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    /// Creates an `error` entry.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}

/// A single run attempt of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Unique execution identifier.
    pub id: Uuid,
    /// Pipeline this execution runs.
    pub pipeline_id: Uuid,
    /// What started the execution.
    pub trigger: TriggerType,
    /// Current status.
    pub status: ExecutionStatus,
    /// Append-only log.
    pub logs: Vec<LogEntry>,
    /// Output preview captured from a successful run.
    pub output: Option<String>,
    /// Failure cause for failed or cancelled runs.
    pub error: Option<String>,
    /// When the execution was requested.
    pub started_at: Timestamp,
    /// When a worker picked the execution up.
    pub running_at: Option<Timestamp>,
    /// When the execution reached a terminal status.
    pub finished_at: Option<Timestamp>,
}

impl Execution {
    /// Returns whether the execution has reached a terminal status.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns log entries starting at `since`.
    pub fn logs_since(&self, since: usize) -> &[LogEntry] {
        self.logs.get(since..).unwrap_or_default()
    }
}

/// Data for creating a new execution.
#[derive(Debug, Clone, Copy)]
pub struct NewExecution {
    /// Pipeline to execute.
    pub pipeline_id: Uuid,
    /// What is starting the execution.
    pub trigger: TriggerType,
}

impl NewExecution {
    /// Creates a manually triggered execution request.
    pub fn manual(pipeline_id: Uuid) -> Self {
        Self {
            pipeline_id,
            trigger: TriggerType::Manual,
        }
    }

    /// Creates a schedule-triggered execution request.
    pub fn scheduled(pipeline_id: Uuid) -> Self {
        Self {
            pipeline_id,
            trigger: TriggerType::Schedule,
        }
    }
}

/// Terminal outcome recorded by [`finish_execution`].
///
/// [`finish_execution`]: crate::query::ExecutionRepository::finish_execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The run completed; carries the output preview.
    Succeeded(Option<String>),
    /// The run failed; carries the cause.
    Failed(String),
    /// The run was cancelled; carries the reason.
    Cancelled(String),
}

impl ExecutionOutcome {
    /// Returns the status this outcome moves an execution to.
    pub fn status(&self) -> ExecutionStatus {
        match self {
            Self::Succeeded(_) => ExecutionStatus::Succeeded,
            Self::Failed(_) => ExecutionStatus::Failed,
            Self::Cancelled(_) => ExecutionStatus::Cancelled,
        }
    }

    /// Returns the closing log line for this outcome.
    pub(crate) fn log_entry(&self) -> LogEntry {
        match self {
            Self::Succeeded(_) => LogEntry::new(LogLevel::Success, "Execution completed successfully"),
            Self::Failed(cause) => LogEntry::error(format!("Execution failed: {cause}")),
            Self::Cancelled(reason) => LogEntry::warning(format!("Execution cancelled: {reason}")),
        }
    }
}
