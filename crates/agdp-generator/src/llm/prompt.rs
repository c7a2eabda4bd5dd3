//! Prompt construction for each artifact target.

use crate::{ArtifactTarget, GenerationRequest};

pub(super) const SYSTEM_PROMPT: &str = "You are a senior data engineer. You write production-ready \
data pipeline code. Reply with the requested file only: no explanations, no markdown prose.";

/// Builds the user message asking for one target.
pub(super) fn user_prompt(target: ArtifactTarget, request: &GenerationRequest) -> String {
    let dataframe = if request.uses_polars() { "polars" } else { "pandas" };
    let instructions = match target {
        ArtifactTarget::Python => format!(
            "Write a Python ETL script using {dataframe} with extract, transform and load \
             functions and a __main__ entry point that runs them and prints how many rows \
             were processed."
        ),
        ArtifactTarget::Sql => "Write a DuckDB SQL script that loads the source data, applies \
             the transformation and writes the result to Parquet."
            .to_owned(),
        ArtifactTarget::Soda => "Write SodaCL data quality checks (YAML) for the transformed \
             table covering row count, missing values, validity and duplicates."
            .to_owned(),
        ArtifactTarget::Prefect => format!(
            "Write a Prefect 2 flow using {dataframe} where extract, transform and load are \
             tasks, extract retries twice, and the module runs the flow when executed."
        ),
    };

    let mut message = format!("Pipeline description:\n{}\n\n{instructions}", request.prompt.trim());
    if !request.features.is_empty() {
        let flags: Vec<&str> = request.features.iter().map(String::as_str).collect();
        message.push_str("\n\nEnabled features: ");
        message.push_str(&flags.join(", "));
    }

    message
}

#[cfg(test)]
mod tests {
    use agdp_store::model::Features;

    use super::*;

    #[test]
    fn includes_prompt_and_features() -> crate::Result<()> {
        let features: Features = ["polars".to_owned(), "custom-flag".to_owned()].into();
        let request = GenerationRequest::new("daily sales ETL", features, "gpt-4")?;

        let message = user_prompt(ArtifactTarget::Python, &request);
        assert!(message.contains("daily sales ETL"));
        assert!(message.contains("using polars"));
        assert!(message.contains("custom-flag"));
        Ok(())
    }
}
