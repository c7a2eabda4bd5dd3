//! Generation requests and artifact targets.

use agdp_store::model::{Features, Pipeline, Settings};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, ErrorKind, Result};

/// Feature flag selecting polars instead of pandas.
pub const FEATURE_POLARS: &str = "polars";
/// Feature flag requesting a DuckDB SQL artifact.
pub const FEATURE_DUCKDB: &str = "duckdb";
/// Feature flag requesting Soda data quality checks.
pub const FEATURE_SODA: &str = "soda";
/// Feature flag requesting a Prefect flow.
pub const FEATURE_PREFECT: &str = "prefect";

/// Target representation of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactTarget {
    /// Python ETL script.
    Python,
    /// DuckDB SQL script.
    Sql,
    /// SodaCL checks.
    Soda,
    /// Prefect flow.
    Prefect,
}

impl ArtifactTarget {
    /// Returns the feature flag that enables this target, if any.
    pub fn feature(self) -> Option<&'static str> {
        match self {
            Self::Python => None,
            Self::Sql => Some(FEATURE_DUCKDB),
            Self::Soda => Some(FEATURE_SODA),
            Self::Prefect => Some(FEATURE_PREFECT),
        }
    }

    /// Returns the targets produced for a set of feature flags.
    pub fn for_features(features: &Features) -> Vec<Self> {
        Self::iter()
            .filter(|target| target.feature().is_none_or(|flag| features.contains(flag)))
            .collect()
    }

    /// Returns the file name used when the artifact is written to disk.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Python => "pipeline.py",
            Self::Sql => "pipeline.sql",
            Self::Soda => "checks.yml",
            Self::Prefect => "flow.py",
        }
    }
}

/// Everything a generator needs to produce artifacts for one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Natural-language description of the pipeline.
    pub prompt: String,
    /// Opaque feature flags.
    pub features: Features,
    /// Model identifier from the settings snapshot.
    pub model: String,
}

impl GenerationRequest {
    /// Creates a request, rejecting blank prompts and models.
    pub fn new(prompt: impl Into<String>, features: Features, model: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        let model = model.into();
        if prompt.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput).with_message("Prompt must not be empty"));
        }
        if model.trim().is_empty() {
            return Err(Error::new(ErrorKind::Configuration).with_message("Model must not be empty"));
        }

        Ok(Self {
            prompt,
            features,
            model,
        })
    }

    /// Builds a request from a pipeline and the current settings.
    pub fn from_pipeline(pipeline: &Pipeline, settings: &Settings) -> Result<Self> {
        Self::new(
            pipeline.prompt.clone(),
            pipeline.features.clone(),
            settings.llm_model.clone(),
        )
    }

    /// Returns the targets this request must produce.
    pub fn targets(&self) -> Vec<ArtifactTarget> {
        ArtifactTarget::for_features(&self.features)
    }

    /// Returns whether a feature flag is set.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Returns whether polars should be used instead of pandas.
    pub fn uses_polars(&self) -> bool {
        self.has_feature(FEATURE_POLARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(flags: &[&str]) -> Features {
        flags.iter().map(|flag| (*flag).to_owned()).collect()
    }

    #[test]
    fn python_is_always_a_target() {
        let targets = ArtifactTarget::for_features(&Features::new());
        assert_eq!(targets, vec![ArtifactTarget::Python]);
    }

    #[test]
    fn flags_enable_targets() {
        let targets = ArtifactTarget::for_features(&features(&["soda", "duckdb", "unknown"]));
        assert_eq!(
            targets,
            vec![ArtifactTarget::Python, ArtifactTarget::Sql, ArtifactTarget::Soda]
        );
    }

    #[test]
    fn target_names_are_snake_case() {
        assert_eq!(ArtifactTarget::Prefect.to_string(), "prefect");
        assert_eq!(ArtifactTarget::Sql.as_ref(), "sql");
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let result = GenerationRequest::new("   ", Features::new(), "gpt-4");
        assert!(result.is_err_and(|e| e.kind == ErrorKind::InvalidInput));
    }
}
