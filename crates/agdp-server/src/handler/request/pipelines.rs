//! Pipeline request types.

use agdp_store::model::{Features, NewPipeline, UpdatePipeline as UpdatePipelineModel};
use agdp_store::types::CronSchedule;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

/// Request payload for creating a new pipeline.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipeline {
    /// Human-readable name (1-200 characters).
    #[validate(length(min = 1, max = 200), custom(function = "validate_name"))]
    pub name: String,
    /// Optional longer description (max 2000 characters).
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Natural-language description of what the pipeline should do.
    #[validate(length(min = 10, max = 20000))]
    pub prompt: String,
    /// Feature flags passed to the code generator, e.g. `polars`, `duckdb`,
    /// `soda` or `prefect`.
    #[serde(default)]
    #[validate(custom(function = "validate_features"))]
    pub features: Features,
}

impl CreatePipeline {
    /// Converts this request into a [`NewPipeline`] model.
    #[inline]
    pub fn into_model(self) -> NewPipeline {
        NewPipeline {
            name: self.name.trim().to_owned(),
            description: self.description,
            prompt: self.prompt,
            features: normalize_features(self.features),
        }
    }
}

/// Request payload for updating a pipeline.
///
/// Absent fields are left unchanged. `description` and `schedule` accept
/// `null` to clear the current value.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePipeline {
    /// New name (1-200 characters).
    #[validate(length(min = 1, max = 200), custom(function = "validate_name"))]
    pub name: Option<String>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schemars(with = "Option<String>")]
    pub description: Option<Option<String>>,
    /// New prompt. Changing it discards generated artifacts.
    #[validate(length(min = 10, max = 20000))]
    pub prompt: Option<String>,
    /// New feature flags. Changing them discards generated artifacts.
    #[validate(custom(function = "validate_features"))]
    pub features: Option<Features>,
    /// Cron schedule in UTC; `null` removes the schedule.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schemars(with = "Option<CronSchedule>")]
    pub schedule: Option<Option<CronSchedule>>,
    /// Archives the pipeline, making it read-only.
    #[serde(default)]
    pub archive: bool,
}

impl UpdatePipeline {
    /// Converts this request into an [`UpdatePipelineModel`].
    #[inline]
    pub fn into_model(self) -> UpdatePipelineModel {
        UpdatePipelineModel {
            name: self.name.map(|name| name.trim().to_owned()),
            description: self.description,
            prompt: self.prompt,
            features: self.features.map(normalize_features),
            schedule: self.schedule,
            archive: self.archive,
        }
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Names are trimmed before they are stored.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name").with_message("name must not be blank".into()));
    }
    Ok(())
}

/// Feature flags are short identifiers.
fn validate_features(features: &Features) -> Result<(), ValidationError> {
    if features.len() > 32 {
        return Err(ValidationError::new("features").with_message("at most 32 features".into()));
    }

    let valid = features.iter().all(|feature| {
        let feature = feature.trim();
        !feature.is_empty()
            && feature.len() <= 64
            && feature
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("features")
            .with_message("features must be non-empty identifiers of letters, digits, '_', '-' or '.'".into()))
    }
}

fn normalize_features(features: Features) -> Features {
    features
        .into_iter()
        .map(|feature| feature.trim().to_ascii_lowercase())
        .collect()
}
