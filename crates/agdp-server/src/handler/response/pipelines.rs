//! Pipeline response types.

use agdp_store::model::{self, Artifacts, Features};
use agdp_store::types::{CronSchedule, PipelineStatus};
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full pipeline representation, including generated artifacts.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Unique pipeline identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Natural-language description the artifacts are generated from.
    pub prompt: String,
    /// Feature flags passed to the code generator.
    pub features: Features,
    /// Generated source per target (`python`, `sql`, `soda`, `prefect`).
    pub artifacts: Artifacts,
    /// Cron schedule in UTC.
    pub schedule: Option<CronSchedule>,
    /// Next time the schedule fires, for scheduled pipelines.
    pub next_run_at: Option<Timestamp>,
    /// Lifecycle status.
    pub status: PipelineStatus,
    /// Model that produced the current artifacts.
    pub generated_by: Option<String>,
    /// Counter bumped on every change.
    pub revision: u64,
    /// Timestamp when the pipeline was created.
    pub created_at: Timestamp,
    /// Timestamp when the pipeline was last modified.
    pub updated_at: Timestamp,
    /// Timestamp of the last successful generation.
    pub generated_at: Option<Timestamp>,
}

impl Pipeline {
    /// Creates a Pipeline response from a store model.
    pub fn from_model(pipeline: model::Pipeline) -> Self {
        let next_run_at = pipeline.next_run_at(Timestamp::now());

        Self {
            id: pipeline.id,
            name: pipeline.name,
            description: pipeline.description,
            prompt: pipeline.prompt,
            features: pipeline.features,
            artifacts: pipeline.artifacts,
            schedule: pipeline.schedule,
            next_run_at,
            status: pipeline.status,
            generated_by: pipeline.generated_by,
            revision: pipeline.revision,
            created_at: pipeline.created_at,
            updated_at: pipeline.updated_at,
            generated_at: pipeline.generated_at,
        }
    }
}

/// Pipeline summary returned by list endpoints, without artifacts.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    /// Unique pipeline identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: PipelineStatus,
    /// Cron schedule in UTC.
    pub schedule: Option<CronSchedule>,
    /// Names of the generated artifacts.
    pub targets: Vec<String>,
    /// Timestamp when the pipeline was created.
    pub created_at: Timestamp,
    /// Timestamp when the pipeline was last modified.
    pub updated_at: Timestamp,
}

impl PipelineSummary {
    /// Creates a summary from a store model.
    pub fn from_model(pipeline: model::Pipeline) -> Self {
        Self {
            id: pipeline.id,
            name: pipeline.name,
            description: pipeline.description,
            status: pipeline.status,
            schedule: pipeline.schedule,
            targets: pipeline.artifacts.into_keys().collect(),
            created_at: pipeline.created_at,
            updated_at: pipeline.updated_at,
        }
    }

    /// Creates a list of summaries from store models.
    pub fn from_models(models: Vec<model::Pipeline>) -> Vec<Self> {
        models.into_iter().map(Self::from_model).collect()
    }
}

/// Response for listing pipelines.
pub type PipelineSummaries = Vec<PipelineSummary>;
