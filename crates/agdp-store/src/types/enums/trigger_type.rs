//! What started an execution.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines how an execution was initiated.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
pub enum TriggerType {
    /// Started by an API request
    #[serde(rename = "manual")]
    #[strum(serialize = "manual")]
    #[default]
    Manual,

    /// Started by the scheduler from the pipeline's cron expression
    #[serde(rename = "schedule")]
    #[strum(serialize = "schedule")]
    Schedule,
}

impl TriggerType {
    /// Returns whether the execution was started by the scheduler.
    #[inline]
    pub fn is_scheduled(self) -> bool {
        matches!(self, TriggerType::Schedule)
    }
}
