//! LLM client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for model requests: 120 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Configuration for the LLM HTTP client.
///
/// The endpoint, model and API key come from the runtime settings; this
/// only covers transport and sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct LlmConfig {
    /// Model request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "llm-timeout", env = "LLM_TIMEOUT", default_value = "120")
    )]
    #[serde(default = "default_timeout_secs")]
    pub llm_timeout: u64,

    /// Sampling temperature passed to the model
    #[cfg_attr(
        feature = "config",
        arg(long = "llm-temperature", env = "LLM_TEMPERATURE", default_value = "0.2")
    )]
    #[serde(default = "default_temperature")]
    pub llm_temperature: f32,

    /// Upper bound on tokens per completion
    #[cfg_attr(feature = "config", arg(long = "llm-max-tokens", env = "LLM_MAX_TOKENS"))]
    #[serde(default)]
    pub llm_max_tokens: Option<u32>,

    /// User-Agent header to send with model requests
    #[cfg_attr(feature = "config", arg(long = "llm-user-agent", env = "LLM_USER_AGENT"))]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_timeout: default_timeout_secs(),
            llm_temperature: default_temperature(),
            llm_max_tokens: None,
            user_agent: None,
        }
    }
}

impl LlmConfig {
    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.llm_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.llm_timeout)
        }
    }

    /// Returns the effective temperature, clamped to the range models accept.
    pub fn effective_temperature(&self) -> f32 {
        if self.llm_temperature.is_finite() {
            self.llm_temperature.clamp(0.0, 2.0)
        } else {
            DEFAULT_TEMPERATURE
        }
    }

    /// Returns the effective user agent, using the default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("agdp/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.llm_timeout = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.effective_timeout(), Duration::from_secs(120));
        assert!(config.effective_user_agent().starts_with("agdp/"));
    }

    #[test]
    fn zero_timeout_uses_default() {
        let config = LlmConfig::default().with_timeout(0);
        assert_eq!(config.effective_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn temperature_is_clamped() {
        let config = LlmConfig {
            llm_temperature: 7.5,
            ..LlmConfig::default()
        };
        assert_eq!(config.effective_temperature(), 2.0);

        let config = LlmConfig {
            llm_temperature: f32::NAN,
            ..LlmConfig::default()
        };
        assert_eq!(config.effective_temperature(), DEFAULT_TEMPERATURE);
    }
}
