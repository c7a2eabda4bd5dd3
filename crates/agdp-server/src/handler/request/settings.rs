//! Settings request types.

use std::path::PathBuf;

use agdp_store::model::UpdateSettings as UpdateSettingsModel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for updating settings.
///
/// Only the listed fields are accepted; any other field fails the request.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSettings {
    /// Model identifier used for code generation.
    #[validate(length(min = 1, max = 128))]
    pub llm_model: Option<String>,
    /// Base URL of an OpenAI-compatible completion API.
    #[validate(url, length(max = 2048))]
    pub llm_base_url: Option<String>,
    /// API key for the completion API. An empty string removes the key.
    #[validate(length(max = 512))]
    pub llm_api_key: Option<String>,
    /// Directory where artifacts are written before they run.
    #[validate(length(min = 1, max = 1024))]
    pub storage_path: Option<String>,
}

impl UpdateSettings {
    /// Converts this request into an [`UpdateSettingsModel`].
    #[inline]
    pub fn into_model(self) -> UpdateSettingsModel {
        UpdateSettingsModel {
            llm_model: self.llm_model,
            llm_base_url: self.llm_base_url,
            llm_api_key: self.llm_api_key,
            storage_path: self.storage_path.map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<UpdateSettings>(r#"{"llmModel":"gpt-4o","theme":"dark"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_base_url_fails_validation() -> anyhow::Result<()> {
        let request: UpdateSettings = serde_json::from_str(r#"{"llmBaseUrl":"not a url"}"#)?;
        assert!(request.validate().is_err());
        Ok(())
    }

    #[test]
    fn empty_api_key_is_forwarded() -> anyhow::Result<()> {
        let request: UpdateSettings = serde_json::from_str(r#"{"llmApiKey":""}"#)?;
        assert!(request.validate().is_ok());
        assert_eq!(request.into_model().llm_api_key.as_deref(), Some(""));
        Ok(())
    }
}
