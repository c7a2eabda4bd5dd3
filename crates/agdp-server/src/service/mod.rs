//! Application state and dependency injection.

mod config;

use std::time::Duration;

use agdp_generator::GeneratorProvider;
use agdp_runtime::{ExecutionEngine, GenerationService, Scheduler};
use agdp_store::Store;

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder, ServiceConfigBuilderError};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Tracing target for state assembly.
const TRACING_TARGET: &str = "agdp_server::service";

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub store: Store,
    pub generation: GenerationService,
    pub engine: ExecutionEngine,

    scheduler_tick: Duration,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Uses the default generator provider: the LLM generator while an API
    /// key is configured, templates otherwise.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let provider = config.create_generator()?;
        Self::with_provider(config, provider)
    }

    /// Initializes application state with an explicit generator provider.
    pub fn with_provider<P>(config: &ServiceConfig, provider: P) -> Result<Self>
    where
        P: GeneratorProvider + 'static,
    {
        config.validate()?;

        let store = Store::new(config.initial_settings());
        let generation = GenerationService::new(store.clone(), provider);
        let engine = ExecutionEngine::new(store.clone(), &config.runtime);

        tracing::debug!(
            target: TRACING_TARGET,
            runner = %config.runtime.execution_runner,
            scheduler_tick_secs = config.runtime.scheduler_tick_secs,
            "Service state initialized",
        );

        Ok(Self {
            store,
            generation,
            engine,
            scheduler_tick: config.runtime.scheduler_tick(),
        })
    }

    /// Creates a scheduler bound to this state's store and engine.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.store.clone(), self.engine.clone(), self.scheduler_tick)
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(store: Store);
impl_di!(generation: GenerationService);
impl_di!(engine: ExecutionEngine);

#[cfg(test)]
mod tests {
    use agdp_generator::GeneratorService;
    use agdp_generator::template::TemplateGenerator;
    use agdp_runtime::RuntimeConfig;
    use agdp_store::query::SettingsRepository;

    use super::*;

    #[tokio::test]
    async fn state_seeds_settings_from_config() -> anyhow::Result<()> {
        let config = ServiceConfig {
            llm_model: "gpt-4o-mini".to_owned(),
            ..ServiceConfig::default()
        };
        let provider = GeneratorService::new(TemplateGenerator::new());
        let state = ServiceState::with_provider(&config, provider)?;

        let settings = state.store.get_settings().await;
        assert_eq!(settings.llm_model, "gpt-4o-mini");
        assert!(!settings.has_llm_api_key());
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ServiceConfig {
            runtime: RuntimeConfig::default().with_max_concurrent_executions(0),
            ..ServiceConfig::default()
        };
        assert!(ServiceState::from_config(&config).is_err());
    }
}
