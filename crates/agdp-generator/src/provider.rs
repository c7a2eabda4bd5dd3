//! Generator traits and the default settings-driven provider.

use agdp_store::model::{Artifacts, Settings};
use reqwest::Client;

use crate::llm::{LlmConfig, LlmGenerator};
use crate::template::TemplateGenerator;
use crate::{Error, ErrorKind, GenerationRequest, GeneratorService, Result, TRACING_TARGET};

/// Core trait for code generators.
///
/// Implementations return one artifact per target of the request. They
/// must not return a partial set on failure.
#[async_trait::async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Generates the artifacts for a request.
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifacts>;
}

/// Resolves the generator to use for a settings snapshot.
pub trait GeneratorProvider: Send + Sync {
    /// Returns the generator for the given settings.
    fn resolve(&self, settings: &Settings) -> Result<GeneratorService>;
}

impl GeneratorProvider for GeneratorService {
    fn resolve(&self, _settings: &Settings) -> Result<GeneratorService> {
        Ok(self.clone())
    }
}

/// Default provider: LLM when an API key is configured, templates otherwise.
///
/// The HTTP client is built once and shared by every resolved LLM generator.
#[derive(Debug, Clone)]
pub struct GeneratorFactory {
    http: Client,
    config: LlmConfig,
}

impl GeneratorFactory {
    /// Creates a factory with the given LLM client configuration.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(config.effective_user_agent())
            .build()
            .map_err(|e| {
                Error::from_source(ErrorKind::Configuration, e)
                    .with_message("Failed to build the HTTP client")
            })?;

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_secs = config.effective_timeout().as_secs(),
            "Generator factory created",
        );

        Ok(Self { http, config })
    }
}

impl GeneratorProvider for GeneratorFactory {
    fn resolve(&self, settings: &Settings) -> Result<GeneratorService> {
        match settings.llm_api_key.as_deref() {
            Some(api_key) => {
                let generator = LlmGenerator::new(
                    self.http.clone(),
                    self.config.clone(),
                    &settings.llm_base_url,
                    api_key,
                )?;
                Ok(GeneratorService::new(generator))
            }
            None => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    llm_model = %settings.llm_model,
                    "No LLM API key configured, falling back to template generation",
                );
                Ok(GeneratorService::new(TemplateGenerator::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_template_without_api_key() -> Result<()> {
        let factory = GeneratorFactory::new(LlmConfig::default())?;
        let service = factory.resolve(&Settings::default())?;
        assert_eq!(service.name(), "template");
        Ok(())
    }

    #[test]
    fn resolves_llm_with_api_key() -> Result<()> {
        let factory = GeneratorFactory::new(LlmConfig::default())?;
        let settings = Settings {
            llm_api_key: Some("sk-test".to_owned()),
            ..Settings::default()
        };
        let service = factory.resolve(&settings)?;
        assert_eq!(service.name(), "llm");
        Ok(())
    }
}
