//! Runners execute a pipeline's generated artifacts.
//!
//! The engine hands every runner a [`RunContext`] that exposes the pipeline,
//! the settings snapshot taken when the run started, a log sink and the
//! cancellation signal.

mod process;
mod simulated;

use std::fmt;

use agdp_store::Store;
use agdp_store::model::{LogEntry, Pipeline, Settings};
use agdp_store::query::ExecutionRepository;
use agdp_store::types::LogLevel;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

pub use self::process::ProcessRunner;
pub use self::simulated::SimulatedRunner;
use crate::Result;

/// Tracing target for runners.
pub const TRACING_TARGET: &str = "agdp_runtime::runner";

/// Runs a pipeline's artifacts for one execution.
#[async_trait::async_trait]
pub trait ArtifactRunner: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the pipeline and returns the output preview.
    ///
    /// Implementations should stop promptly once the context is cancelled
    /// and return [`Error::Cancelled`](crate::Error::Cancelled).
    async fn run(&self, ctx: &RunContext) -> Result<Option<String>>;
}

/// Everything a runner may use during one execution.
pub struct RunContext {
    store: Store,
    pipeline: Pipeline,
    settings: Settings,
    execution_id: Uuid,
    cancel: CancellationToken,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("pipeline_id", &self.pipeline.id)
            .field("execution_id", &self.execution_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Creates a context for one execution.
    pub fn new(
        store: Store,
        pipeline: Pipeline,
        settings: Settings,
        execution_id: Uuid,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            pipeline,
            settings,
            execution_id,
            cancel,
        }
    }

    /// Returns the pipeline being executed.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the settings snapshot taken when the run started.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the execution identifier.
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes when cancellation is requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Appends a line to the execution log.
    ///
    /// Returns `false` once the execution is terminal and further output is
    /// discarded.
    pub async fn log(&self, level: LogLevel, message: impl Into<String>) -> bool {
        let entry = LogEntry::new(level, message);
        match self.store.append_execution_log(self.execution_id, entry).await {
            Ok(appended) => appended,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    execution_id = %self.execution_id,
                    error = %error,
                    "Failed to append execution log",
                );
                false
            }
        }
    }

    /// Appends an `info` line.
    pub async fn info(&self, message: impl Into<String>) -> bool {
        self.log(LogLevel::Info, message).await
    }
}
