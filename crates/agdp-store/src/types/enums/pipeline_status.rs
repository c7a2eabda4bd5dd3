//! Pipeline status enumeration indicating the lifecycle state of a pipeline.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines the lifecycle status of a pipeline definition.
///
/// Variants are ordered: a pipeline only moves forward through
/// `Draft < Generated < Scheduled < Archived`, except that editing its
/// prompt resets it to `Draft` and clearing its schedule returns it to
/// `Generated`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
pub enum PipelineStatus {
    /// Pipeline has a prompt but no generated artifacts
    #[serde(rename = "draft")]
    #[strum(serialize = "draft")]
    #[default]
    Draft,

    /// Pipeline has generated artifacts and can be executed
    #[serde(rename = "generated")]
    #[strum(serialize = "generated")]
    Generated,

    /// Pipeline has artifacts and a cron schedule
    #[serde(rename = "scheduled")]
    #[strum(serialize = "scheduled")]
    Scheduled,

    /// Pipeline is retired and read-only
    #[serde(rename = "archived")]
    #[strum(serialize = "archived")]
    Archived,
}

impl PipelineStatus {
    /// Returns whether the pipeline is in draft status.
    #[inline]
    pub fn is_draft(self) -> bool {
        matches!(self, PipelineStatus::Draft)
    }

    /// Returns whether the pipeline has a schedule attached.
    #[inline]
    pub fn is_scheduled(self) -> bool {
        matches!(self, PipelineStatus::Scheduled)
    }

    /// Returns whether the pipeline is archived.
    #[inline]
    pub fn is_archived(self) -> bool {
        matches!(self, PipelineStatus::Archived)
    }

    /// Returns whether the pipeline has gone through a successful generation.
    #[inline]
    pub fn is_generated(self) -> bool {
        self >= PipelineStatus::Generated
    }

    /// Returns whether executions can be started for the pipeline.
    #[inline]
    pub fn is_executable(self) -> bool {
        matches!(self, PipelineStatus::Generated | PipelineStatus::Scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_lifecycle() {
        assert!(PipelineStatus::Draft < PipelineStatus::Generated);
        assert!(PipelineStatus::Generated < PipelineStatus::Scheduled);
        assert!(PipelineStatus::Scheduled < PipelineStatus::Archived);
    }

    #[test]
    fn only_generated_and_scheduled_are_executable() {
        assert!(!PipelineStatus::Draft.is_executable());
        assert!(PipelineStatus::Generated.is_executable());
        assert!(PipelineStatus::Scheduled.is_executable());
        assert!(!PipelineStatus::Archived.is_executable());
    }

    #[test]
    fn string_form_matches_wire_form() {
        assert_eq!(PipelineStatus::Generated.to_string(), "generated");
        assert_eq!("scheduled".parse::<PipelineStatus>().ok(), Some(PipelineStatus::Scheduled));
    }
}
