//! Background workers.
//!
//! The only long-running worker is the cron [`Scheduler`]. Execution tasks
//! are owned by the [`ExecutionEngine`]; [`Workers::shutdown`] stops the
//! scheduler first so no new executions start, then drains the engine.
//!
//! [`Scheduler`]: agdp_runtime::Scheduler

use std::time::Duration;

use agdp_runtime::ExecutionEngine;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::service::ServiceState;

/// Tracing target for worker lifecycle.
const TRACING_TARGET: &str = "agdp_server::worker";

/// Handles to the spawned background workers.
#[derive(Debug)]
#[must_use = "workers keep running until shut down"]
pub struct Workers {
    cancel: CancellationToken,
    tracker: TaskTracker,
    engine: ExecutionEngine,
}

impl Workers {
    /// Spawns the background workers for the given state.
    pub fn spawn(state: &ServiceState) -> Self {
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        let scheduler = state.scheduler();
        let token = cancel.clone();
        tracker.spawn(async move {
            // Failures are logged by the scheduler itself.
            let _ = scheduler.run(token).await;
        });
        tracker.close();

        tracing::info!(target: TRACING_TARGET, "Background workers started");

        Self {
            cancel,
            tracker,
            engine: state.engine.clone(),
        }
    }

    /// Returns a token that is cancelled when shutdown begins.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the workers and cancels in-flight executions.
    ///
    /// Waits at most `timeout` for each stage.
    pub async fn shutdown(self, timeout: Duration) {
        tracing::info!(
            target: TRACING_TARGET,
            timeout_secs = timeout.as_secs(),
            "Stopping background workers",
        );

        self.cancel.cancel();
        if tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                target: TRACING_TARGET,
                "Background workers did not stop in time",
            );
        }

        self.engine.shutdown(timeout).await;

        tracing::info!(target: TRACING_TARGET, "Background workers stopped");
    }
}
