//! Runtime configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default number of executions allowed to run at once.
const DEFAULT_MAX_CONCURRENT_EXECUTIONS: usize = 4;

/// Default delay between simulated phases.
const DEFAULT_STEP_DELAY_MS: u64 = 500;

/// Default interval between scheduler ticks.
const DEFAULT_SCHEDULER_TICK_SECS: u64 = 30;

/// Selects how executions run a pipeline's artifacts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunnerKind {
    /// Walks through the pipeline phases without running code.
    #[default]
    Simulated,
    /// Runs the generated Python artifact in a child process.
    Process,
}

/// Configuration for generation, execution and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RuntimeConfig {
    /// How executions run pipeline artifacts
    #[cfg_attr(
        feature = "config",
        arg(long = "execution-runner", env = "EXECUTION_RUNNER", value_enum, default_value = "simulated")
    )]
    #[serde(default)]
    pub execution_runner: RunnerKind,

    /// Interpreter used by the process runner
    #[cfg_attr(
        feature = "config",
        arg(long = "python-interpreter", env = "PYTHON_INTERPRETER", default_value = "python3")
    )]
    #[serde(default = "default_interpreter")]
    pub python_interpreter: String,

    /// Delay between simulated pipeline phases in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long = "simulated-step-delay-ms", env = "SIMULATED_STEP_DELAY_MS", default_value = "500")
    )]
    #[serde(default = "default_step_delay_ms")]
    pub simulated_step_delay_ms: u64,

    /// Maximum number of executions running at once
    #[cfg_attr(
        feature = "config",
        arg(long = "max-concurrent-executions", env = "MAX_CONCURRENT_EXECUTIONS", default_value = "4")
    )]
    #[serde(default = "default_max_concurrent_executions")]
    pub max_concurrent_executions: usize,

    /// Seconds between scheduler ticks
    #[cfg_attr(
        feature = "config",
        arg(long = "scheduler-tick-secs", env = "SCHEDULER_TICK_SECS", default_value = "30")
    )]
    #[serde(default = "default_scheduler_tick_secs")]
    pub scheduler_tick_secs: u64,
}

fn default_interpreter() -> String {
    "python3".to_owned()
}

fn default_step_delay_ms() -> u64 {
    DEFAULT_STEP_DELAY_MS
}

fn default_max_concurrent_executions() -> usize {
    DEFAULT_MAX_CONCURRENT_EXECUTIONS
}

fn default_scheduler_tick_secs() -> u64 {
    DEFAULT_SCHEDULER_TICK_SECS
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            execution_runner: RunnerKind::default(),
            python_interpreter: default_interpreter(),
            simulated_step_delay_ms: default_step_delay_ms(),
            max_concurrent_executions: default_max_concurrent_executions(),
            scheduler_tick_secs: default_scheduler_tick_secs(),
        }
    }
}

impl RuntimeConfig {
    /// Returns the delay between simulated phases.
    #[inline]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_step_delay_ms)
    }

    /// Returns the interval between scheduler ticks.
    #[inline]
    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_secs(self.scheduler_tick_secs)
    }

    /// Set the runner kind.
    #[must_use]
    pub fn with_runner(mut self, runner: RunnerKind) -> Self {
        self.execution_runner = runner;
        self
    }

    /// Set the delay between simulated phases in milliseconds.
    #[must_use]
    pub fn with_step_delay_ms(mut self, delay_ms: u64) -> Self {
        self.simulated_step_delay_ms = delay_ms;
        self
    }

    /// Set the maximum number of concurrent executions.
    #[must_use]
    pub fn with_max_concurrent_executions(mut self, max: usize) -> Self {
        self.max_concurrent_executions = max;
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_executions == 0 {
            return Err("Maximum concurrent executions cannot be zero".to_owned());
        }
        // Ticks longer than a minute would skip cron minutes.
        if !(1..=60).contains(&self.scheduler_tick_secs) {
            return Err("Scheduler tick must be between 1 and 60 seconds".to_owned());
        }
        if self.execution_runner == RunnerKind::Process && self.python_interpreter.trim().is_empty() {
            return Err("Python interpreter cannot be empty for the process runner".to_owned());
        }
        Ok(())
    }
}
