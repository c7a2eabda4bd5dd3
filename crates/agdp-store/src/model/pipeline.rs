//! Pipeline model.

use std::collections::{BTreeMap, BTreeSet};

use jiff::Timestamp;
use uuid::Uuid;

use crate::types::{CronSchedule, PipelineStatus};

/// Generated source text keyed by target name (`python`, `sql`, ...).
pub type Artifacts = BTreeMap<String, String>;

/// Opaque feature flags enabled for a pipeline.
pub type Features = BTreeSet<String>;

/// Pipeline definition: a natural-language prompt and what was generated from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Unique pipeline identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Natural-language description of the data pipeline.
    pub prompt: String,
    /// Feature flags forwarded to the code generator.
    pub features: Features,
    /// Generated artifacts; empty until the first successful generation.
    pub artifacts: Artifacts,
    /// Cron schedule, only present once the pipeline is generated.
    pub schedule: Option<CronSchedule>,
    /// Lifecycle status.
    pub status: PipelineStatus,
    /// Model identifier used for the last successful generation.
    pub generated_by: Option<String>,
    /// Incremented when the artifacts, prompt or features change, or on
    /// archival; used to detect edits that invalidate a running generation.
    pub revision: u64,
    /// When the pipeline was created.
    pub created_at: Timestamp,
    /// When the pipeline was last changed.
    pub updated_at: Timestamp,
    /// When artifacts were last generated.
    pub generated_at: Option<Timestamp>,
}

impl Pipeline {
    /// Returns whether generated artifacts are present.
    #[inline]
    pub fn has_artifacts(&self) -> bool {
        !self.artifacts.is_empty()
    }

    /// Returns whether executions can be started for this pipeline.
    #[inline]
    pub fn is_executable(&self) -> bool {
        self.status.is_executable()
    }

    /// Returns whether the pipeline is archived.
    #[inline]
    pub fn is_archived(&self) -> bool {
        self.status.is_archived()
    }

    /// Returns whether a feature flag is enabled.
    #[inline]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Returns the next time the schedule fires after `now`.
    pub fn next_run_at(&self, now: Timestamp) -> Option<Timestamp> {
        match self.status {
            PipelineStatus::Scheduled => self.schedule.as_ref()?.next_after(now),
            _ => None,
        }
    }
}

/// Data for creating a new pipeline.
#[derive(Debug, Default, Clone)]
pub struct NewPipeline {
    /// Pipeline name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Natural-language prompt.
    pub prompt: String,
    /// Feature flags.
    pub features: Features,
}

/// Data for updating a pipeline.
///
/// Absent fields are left untouched. Double options distinguish "leave as
/// is" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Default, Clone)]
pub struct UpdatePipeline {
    /// New name.
    pub name: Option<String>,
    /// New description, or `Some(None)` to remove it.
    pub description: Option<Option<String>>,
    /// New prompt; resets a generated pipeline to draft.
    pub prompt: Option<String>,
    /// New feature flags; resets a generated pipeline to draft.
    pub features: Option<Features>,
    /// New schedule, or `Some(None)` to remove it.
    pub schedule: Option<Option<CronSchedule>>,
    /// Archives the pipeline when set.
    pub archive: bool,
}

impl UpdatePipeline {
    /// Returns whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.prompt.is_none()
            && self.features.is_none()
            && self.schedule.is_none()
            && !self.archive
    }
}
