use std::path::PathBuf;

use agdp_generator::GeneratorFactory;
use agdp_generator::llm::LlmConfig;
use agdp_runtime::RuntimeConfig;
use agdp_store::model::Settings;
#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::service::{Error, Result};

/// Default values for configuration options.
mod defaults {
    use std::path::PathBuf;

    pub use agdp_store::model::{
        DEFAULT_LLM_BASE_URL as LLM_BASE_URL, DEFAULT_LLM_MODEL as LLM_MODEL,
    };

    /// Default directory for materialised artifacts.
    pub fn storage_path() -> PathBuf {
        agdp_store::model::DEFAULT_STORAGE_PATH.into()
    }
}

/// App [`state`] configuration.
///
/// The LLM fields seed the initial [`Settings`]; clients may replace them at
/// runtime through the settings endpoint.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Model identifier used for code generation
    #[cfg_attr(
        feature = "config",
        arg(long = "llm-model", env = "LLM_MODEL", default_value = "gpt-4")
    )]
    #[builder(default = "defaults::LLM_MODEL.to_owned()")]
    pub llm_model: String,

    /// Base URL of the OpenAI-compatible completion API
    #[cfg_attr(
        feature = "config",
        arg(long = "llm-base-url", env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")
    )]
    #[builder(default = "defaults::LLM_BASE_URL.to_owned()")]
    pub llm_base_url: String,

    /// API key for the completion API; templates are used when absent
    #[cfg_attr(feature = "config", arg(long = "llm-api-key", env = "LLM_API_KEY"))]
    #[serde(default, skip_serializing)]
    #[builder(default)]
    pub llm_api_key: Option<String>,

    /// Directory where artifacts are written before they run
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-path", env = "STORAGE_PATH", default_value = "./pipelines")
    )]
    #[builder(default = "defaults::storage_path()")]
    pub storage_path: PathBuf,

    /// Execution engine and scheduler configuration.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    #[builder(default)]
    pub runtime: RuntimeConfig,

    /// LLM transport configuration.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    #[builder(default)]
    pub llm: LlmConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            llm_model: defaults::LLM_MODEL.to_owned(),
            llm_base_url: defaults::LLM_BASE_URL.to_owned(),
            llm_api_key: None,
            storage_path: defaults::storage_path(),
            runtime: RuntimeConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Returns the settings the store starts with.
    ///
    /// A blank API key counts as no key.
    pub fn initial_settings(&self) -> Settings {
        Settings {
            llm_model: self.llm_model.trim().to_owned(),
            llm_base_url: self.llm_base_url.trim().trim_end_matches('/').to_owned(),
            llm_api_key: self
                .llm_api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned),
            storage_path: self.storage_path.clone(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.initial_settings().validate()?;
        self.runtime.validate().map_err(Error::config)?;
        Ok(())
    }

    /// Creates the default generator provider.
    pub fn create_generator(&self) -> Result<GeneratorFactory> {
        GeneratorFactory::new(self.llm.clone()).map_err(Error::from)
    }
}

impl ServiceConfigBuilder {
    /// Wrapper for builder validation that returns String errors.
    fn validate(builder: &ServiceConfigBuilder) -> Result<(), String> {
        if builder
            .llm_model
            .as_ref()
            .is_some_and(|model| model.trim().is_empty())
        {
            return Err("LLM model cannot be empty".to_owned());
        }

        let bad_scheme = |url: &String| !(url.starts_with("http://") || url.starts_with("https://"));
        if builder.llm_base_url.as_ref().is_some_and(bad_scheme) {
            return Err("LLM base URL must start with http:// or https://".to_owned());
        }

        if let Some(runtime) = &builder.runtime {
            runtime.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use agdp_runtime::RunnerKind;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_settings(), Settings::default());
    }

    #[test]
    fn builder_applies_defaults() -> anyhow::Result<()> {
        let config = ServiceConfig::builder()
            .with_llm_api_key("sk-test")
            .build()?;

        assert_eq!(config.llm_model, "gpt-4");
        assert_eq!(config.runtime.execution_runner, RunnerKind::Simulated);
        assert!(config.initial_settings().has_llm_api_key());
        Ok(())
    }

    #[test]
    fn builder_rejects_bad_base_url() {
        let result = ServiceConfig::builder()
            .with_llm_base_url("ftp://models.local")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn blank_api_key_is_no_key() {
        let config = ServiceConfig {
            llm_api_key: Some("   ".to_owned()),
            llm_base_url: "https://api.openai.com/v1/".to_owned(),
            ..ServiceConfig::default()
        };

        let settings = config.initial_settings();
        assert!(!settings.has_llm_api_key());
        assert_eq!(settings.llm_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn validate_reports_runtime_problems() {
        let config = ServiceConfig {
            runtime: RuntimeConfig::default().with_max_concurrent_executions(0),
            ..ServiceConfig::default()
        };
        let error = config.validate().unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn api_key_is_not_serialized() -> anyhow::Result<()> {
        let config = ServiceConfig {
            llm_api_key: Some("sk-secret".to_owned()),
            ..ServiceConfig::default()
        };
        let json = serde_json::to_string(&config)?;
        assert!(!json.contains("sk-secret"));
        Ok(())
    }
}
