//! Deterministic template generator.
//!
//! Renders fixed extract/transform/load scaffolding that embeds the prompt.
//! It needs no network access and is used whenever no LLM API key is
//! configured.

mod prefect;
mod python;
mod soda;
mod sql;

use agdp_store::model::Artifacts;

use crate::{ArtifactTarget, CodeGenerator, GenerationRequest, Result};

/// Tracing target for template rendering.
pub const TRACING_TARGET: &str = "agdp_generator::template";

/// Dataframe library the generated Python targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dataframe {
    Pandas,
    Polars,
}

impl Dataframe {
    fn for_request(request: &GenerationRequest) -> Self {
        if request.uses_polars() {
            Self::Polars
        } else {
            Self::Pandas
        }
    }
}

/// Generator that renders built-in templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    /// Creates a new template generator.
    pub fn new() -> Self {
        Self
    }

    /// Renders a single target.
    pub fn render(&self, target: ArtifactTarget, request: &GenerationRequest) -> String {
        let prompt = single_line(&request.prompt);
        let dataframe = Dataframe::for_request(request);
        match target {
            ArtifactTarget::Python => python::render(&prompt, dataframe),
            ArtifactTarget::Sql => sql::render(&prompt),
            ArtifactTarget::Soda => soda::render(&prompt),
            ArtifactTarget::Prefect => prefect::render(&prompt, dataframe),
        }
    }
}

#[async_trait::async_trait]
impl CodeGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Artifacts> {
        let artifacts: Artifacts = request
            .targets()
            .into_iter()
            .map(|target| (target.to_string(), self.render(target, request)))
            .collect();

        tracing::debug!(
            target: TRACING_TARGET,
            artifacts = artifacts.len(),
            polars = request.uses_polars(),
            "Templates rendered",
        );

        Ok(artifacts)
    }
}

/// Collapses the prompt onto one line so it fits in a comment.
fn single_line(prompt: &str) -> String {
    prompt.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use agdp_store::model::Features;

    use super::*;

    fn request(flags: &[&str]) -> Result<GenerationRequest> {
        let features: Features = flags.iter().map(|f| (*f).to_owned()).collect();
        GenerationRequest::new("daily sales ETL\nfrom the\tPOS export", features, "gpt-4")
    }

    #[tokio::test]
    async fn renders_every_requested_target() -> Result<()> {
        let request = request(&["duckdb", "soda", "prefect"])?;
        let artifacts = TemplateGenerator::new().generate(&request).await?;

        assert_eq!(artifacts.len(), 4);
        for target in ["python", "sql", "soda", "prefect"] {
            let source = artifacts.get(target).map(String::as_str).unwrap_or_default();
            assert!(source.contains("daily sales ETL from the POS export"), "{target}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn pandas_by_default() -> Result<()> {
        let artifacts = TemplateGenerator::new().generate(&request(&[])?).await?;
        let python = &artifacts["python"];
        assert!(python.contains("import pandas as pd"));
        assert!(!python.contains("polars"));
        Ok(())
    }

    #[tokio::test]
    async fn polars_flag_switches_library() -> Result<()> {
        let request = request(&["polars", "prefect"])?;
        let artifacts = TemplateGenerator::new().generate(&request).await?;
        assert!(artifacts["python"].contains("import polars as pl"));
        assert!(artifacts["prefect"].contains("import polars as pl"));
        Ok(())
    }

    #[test]
    fn prompt_is_collapsed() {
        assert_eq!(single_line("  a\n b\t\tc "), "a b c");
    }
}
