//! Execution status enumeration indicating the state of a pipeline execution.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines the state of a single pipeline execution.
///
/// Executions follow `Pending -> Running -> {Succeeded | Failed | Cancelled}`;
/// a pending execution may also be cancelled before it starts running.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
pub enum ExecutionStatus {
    /// Execution is waiting for a worker
    #[serde(rename = "pending")]
    #[strum(serialize = "pending")]
    #[default]
    Pending,

    /// Execution is in progress
    #[serde(rename = "running")]
    #[strum(serialize = "running")]
    Running,

    /// Execution finished successfully
    #[serde(rename = "succeeded")]
    #[strum(serialize = "succeeded")]
    Succeeded,

    /// Execution failed with an error
    #[serde(rename = "failed")]
    #[strum(serialize = "failed")]
    Failed,

    /// Execution was cancelled
    #[serde(rename = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
}

impl ExecutionStatus {
    /// Returns whether the execution is still active (pending or running).
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, ExecutionStatus::Pending | ExecutionStatus::Running)
    }

    /// Returns whether the execution has reached a terminal state.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Returns whether the execution is currently running.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, ExecutionStatus::Running)
    }

    /// Returns whether the execution finished successfully.
    #[inline]
    pub fn is_succeeded(self) -> bool {
        matches!(self, ExecutionStatus::Succeeded)
    }

    /// Returns whether the execution was cancelled.
    #[inline]
    pub fn is_cancelled(self) -> bool {
        matches!(self, ExecutionStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_status_is_either_active_or_terminal() {
        for status in ExecutionStatus::iter() {
            assert_ne!(status.is_active(), status.is_terminal());
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(ExecutionStatus::Succeeded.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
    }
}
