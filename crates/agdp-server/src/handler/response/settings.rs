//! Settings response types.

use agdp_store::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Current settings. The API key itself is never returned.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Model identifier used for code generation.
    pub llm_model: String,
    /// Base URL of the completion API.
    pub llm_base_url: String,
    /// Whether an API key is configured.
    pub has_llm_api_key: bool,
    /// Directory where artifacts are written before they run.
    pub storage_path: String,
}

impl Settings {
    /// Creates a Settings response from the store snapshot.
    pub fn from_model(settings: model::Settings) -> Self {
        Self {
            has_llm_api_key: settings.has_llm_api_key(),
            llm_model: settings.llm_model,
            llm_base_url: settings.llm_base_url,
            storage_path: settings.storage_path.display().to_string(),
        }
    }
}
