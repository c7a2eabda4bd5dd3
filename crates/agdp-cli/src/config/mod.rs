//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, port, shutdown
//! ├── middleware: MiddlewareConfig # CORS, OpenAPI, recovery/timeouts
//! └── service: ServiceConfig       # LLM, storage, runtime, scheduler
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! agdp --llm-model gpt-4o-mini --port 8080
//!
//! # Or via environment variables
//! LLM_MODEL=gpt-4o-mini PORT=8080 agdp
//! ```

mod middleware;
mod server;

use std::process;

use agdp_server::service::ServiceConfig;
use anyhow::Context;
use clap::Parser;
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
///
/// Combines all configuration groups for the AGDP server:
/// - [`ServerConfig`]: Network binding and shutdown
/// - [`MiddlewareConfig`]: HTTP middleware (CORS, OpenAPI, recovery)
/// - [`ServiceConfig`]: Generator, storage and execution runtime
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "agdp")]
#[command(about = "AI-generated data pipelines server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, OpenAPI, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Generator, storage and runtime configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so its values act
    /// as environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration at info level. The LLM API key is never logged.
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            llm_model = %self.service.llm_model,
            llm_base_url = %self.service.llm_base_url,
            llm_api_key_configured = self.service.llm_api_key.is_some(),
            llm_timeout_secs = self.service.llm.llm_timeout,
            storage_path = %self.service.storage_path.display(),
            "Generator configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            runner = %self.service.runtime.execution_runner,
            max_concurrent_executions = self.service.runtime.max_concurrent_executions,
            scheduler_tick_secs = self.service.runtime.scheduler_tick_secs,
            "Runtime configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["agdp"])?;
        cli.validate()?;
        assert_eq!(cli.server.port, 8000);
        assert_eq!(cli.service.llm_model, "gpt-4");
        Ok(())
    }

    #[test]
    fn flags_reach_nested_configs() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "agdp",
            "--port",
            "9000",
            "--request-timeout",
            "60",
            "--cors-origins",
            "https://a.example,https://b.example",
            "--max-concurrent-executions",
            "2",
        ])?;

        assert_eq!(cli.server.port, 9000);
        assert_eq!(cli.middleware.recovery.request_timeout, 60);
        assert_eq!(cli.middleware.cors.allowed_origins.len(), 2);
        assert_eq!(cli.service.runtime.max_concurrent_executions, 2);
        Ok(())
    }

    #[test]
    fn invalid_service_config_is_rejected() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["agdp", "--llm-base-url", "ftp://example.com"])?;
        assert!(cli.validate().is_err());
        Ok(())
    }
}
