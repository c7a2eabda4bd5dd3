//! Runner that simulates the pipeline phases.

use std::time::Duration;

use super::{ArtifactRunner, RunContext, TRACING_TARGET};
use crate::{Error, Result};

/// Default number of rows reported by a simulated run.
const DEFAULT_ROWS: u64 = 1000;

const PHASES: [&str; 3] = ["extract", "transform", "load"];

/// Walks through the extract, transform and load phases without running code.
///
/// Used when no interpreter is available and in tests. Each phase logs a
/// line and then waits for the configured delay, honouring cancellation.
#[derive(Debug, Clone)]
pub struct SimulatedRunner {
    step_delay: Duration,
    rows: u64,
}

impl SimulatedRunner {
    /// Creates a runner that waits `step_delay` after each phase.
    pub fn new(step_delay: Duration) -> Self {
        Self {
            step_delay,
            rows: DEFAULT_ROWS,
        }
    }

    /// Sets the number of rows reported in the output.
    #[must_use]
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = rows;
        self
    }

    async fn pause(&self, ctx: &RunContext) -> Result<()> {
        tokio::select! {
            biased;
            () = ctx.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(self.step_delay) => Ok(()),
        }
    }
}

impl Default for SimulatedRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait::async_trait]
impl ArtifactRunner for SimulatedRunner {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn run(&self, ctx: &RunContext) -> Result<Option<String>> {
        let artifacts = &ctx.pipeline().artifacts;
        if !artifacts.contains_key("python") {
            return Err(Error::execution_failed("pipeline has no python artifact"));
        }

        let targets: Vec<&str> = artifacts.keys().map(String::as_str).collect();
        ctx.info(format!("Loaded artifacts: {}", targets.join(", "))).await;

        for phase in PHASES {
            if !ctx.info(format!("Running {phase} phase...")).await {
                return Err(Error::Cancelled);
            }
            self.pause(ctx).await?;
        }

        tracing::debug!(
            target: TRACING_TARGET,
            execution_id = %ctx.execution_id(),
            rows = self.rows,
            "Simulated run finished",
        );

        Ok(Some(format!(
            "Pipeline executed successfully. Processed {} rows.",
            self.rows
        )))
    }
}
