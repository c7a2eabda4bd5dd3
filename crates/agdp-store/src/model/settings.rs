//! Process-wide settings.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::{StoreError, StoreResult};

/// Default model identifier.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4";

/// Default base URL of the OpenAI-compatible completion API.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default directory for materialised artifacts.
pub const DEFAULT_STORAGE_PATH: &str = "./pipelines";

/// Settings consumed by code generation and execution.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Model identifier passed to the code generator.
    pub llm_model: String,
    /// Base URL of the OpenAI-compatible completion API.
    pub llm_base_url: String,
    /// API key for the completion API; `None` selects the template generator.
    pub llm_api_key: Option<String>,
    /// Directory where artifacts are written before they run.
    pub storage_path: PathBuf,
}

impl Settings {
    /// Returns whether an API key is configured.
    #[inline]
    pub fn has_llm_api_key(&self) -> bool {
        self.llm_api_key.is_some()
    }

    /// Checks every field and returns the first problem found.
    pub fn validate(&self) -> StoreResult<()> {
        let model = self.llm_model.trim();
        if model.is_empty() {
            return Err(StoreError::validation("llmModel must not be empty"));
        }
        if model.len() > 128 {
            return Err(StoreError::validation(
                "llmModel must be at most 128 characters",
            ));
        }

        let url = Url::parse(&self.llm_base_url)
            .map_err(|e| StoreError::validation(format!("llmBaseUrl is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StoreError::validation(
                "llmBaseUrl must use the http or https scheme",
            ));
        }

        if self.storage_path.as_os_str().is_empty() {
            return Err(StoreError::validation("storagePath must not be empty"));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_model: DEFAULT_LLM_MODEL.to_owned(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_owned(),
            llm_api_key: None,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("llm_model", &self.llm_model)
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "***"))
            .field("storage_path", &self.storage_path)
            .finish()
    }
}

/// Data for updating settings.
///
/// Absent fields keep their current value. An empty API key clears it.
#[derive(Debug, Default, Clone)]
pub struct UpdateSettings {
    /// New model identifier.
    pub llm_model: Option<String>,
    /// New completion API base URL.
    pub llm_base_url: Option<String>,
    /// New API key; an empty string removes the key.
    pub llm_api_key: Option<String>,
    /// New artifact directory.
    pub storage_path: Option<PathBuf>,
}

impl UpdateSettings {
    /// Applies the update to a copy of `current`.
    pub fn apply_to(self, current: &Settings) -> Settings {
        let mut next = current.clone();
        if let Some(model) = self.llm_model {
            next.llm_model = model.trim().to_owned();
        }
        if let Some(base_url) = self.llm_base_url {
            next.llm_base_url = base_url.trim().trim_end_matches('/').to_owned();
        }
        if let Some(api_key) = self.llm_api_key {
            let api_key = api_key.trim();
            next.llm_api_key = (!api_key.is_empty()).then(|| api_key.to_owned());
        }
        if let Some(storage_path) = self.storage_path {
            next.storage_path = storage_path;
        }
        next
    }
}
