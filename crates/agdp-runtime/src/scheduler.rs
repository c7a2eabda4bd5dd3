//! Cron scheduler for scheduled pipelines.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use agdp_store::Store;
use agdp_store::query::{ExecutionRepository, PipelineRepository};
use agdp_store::types::TriggerType;
use jiff::Timestamp;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{ExecutionEngine, Result};

/// Tracing target for the scheduler.
const TRACING_TARGET: &str = "agdp_runtime::scheduler";

/// Starts executions for scheduled pipelines.
///
/// Every tick the scheduler looks at pipelines in scheduled status and
/// starts an execution for each whose cron expression matches the current
/// UTC minute. A pipeline fires at most once per minute, and is skipped
/// while a previous execution is still active.
pub struct Scheduler {
    store: Store,
    engine: ExecutionEngine,
    tick: Duration,
    last_fired: Mutex<HashMap<Uuid, i64>>,
}

impl Scheduler {
    /// Creates a scheduler ticking at the given interval.
    pub fn new(store: Store, engine: ExecutionEngine, tick: Duration) -> Self {
        Self {
            store,
            engine,
            tick,
            last_fired: Mutex::default(),
        }
    }

    /// Run the scheduler until cancelled.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            tick_secs = self.tick.as_secs(),
            "Starting scheduler",
        );

        let result = self.run_inner(cancel).await;

        match &result {
            Ok(()) => {
                tracing::info!(target: TRACING_TARGET, "Scheduler stopped");
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Scheduler failed",
                );
            }
        }

        result
    }

    async fn run_inner(&self, cancel: CancellationToken) -> Result<()> {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(target: TRACING_TARGET, "Scheduler shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = self.fire_due(Timestamp::now()).await {
                        tracing::error!(
                            target: TRACING_TARGET,
                            error = %err,
                            "Scheduler tick failed",
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Starts executions for pipelines due at `now`.
    ///
    /// Returns the identifiers of the started executions.
    pub async fn fire_due(&self, now: Timestamp) -> Result<Vec<Uuid>> {
        let minute = now.as_second().div_euclid(60);
        let pipelines = self.store.list_scheduled_pipelines().await?;
        self.forget_unscheduled(&pipelines.iter().map(|p| p.id).collect::<Vec<_>>());

        let mut started = Vec::new();
        for pipeline in pipelines {
            let Some(schedule) = pipeline.schedule.as_ref() else {
                continue;
            };
            if !schedule.matches_timestamp(now) || self.fired_in(pipeline.id, minute) {
                continue;
            }
            self.mark_fired(pipeline.id, minute);

            if self.store.has_active_execution(pipeline.id).await? {
                tracing::debug!(
                    target: TRACING_TARGET,
                    pipeline_id = %pipeline.id,
                    "Skipping scheduled run, previous execution still active",
                );
                continue;
            }

            match self.engine.start(pipeline.id, TriggerType::Schedule).await {
                Ok(execution) => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        pipeline_id = %pipeline.id,
                        execution_id = %execution.id,
                        schedule = %schedule,
                        "Scheduled execution started",
                    );
                    started.push(execution.id);
                }
                Err(err) => {
                    // The pipeline may have been unscheduled or archived since the listing.
                    tracing::warn!(
                        target: TRACING_TARGET,
                        pipeline_id = %pipeline.id,
                        error = %err,
                        "Failed to start scheduled execution",
                    );
                }
            }
        }

        Ok(started)
    }

    fn fired_in(&self, pipeline_id: Uuid, minute: i64) -> bool {
        self.last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pipeline_id)
            .is_some_and(|last| *last == minute)
    }

    fn mark_fired(&self, pipeline_id: Uuid, minute: i64) {
        self.last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pipeline_id, minute);
    }

    fn forget_unscheduled(&self, scheduled: &[Uuid]) {
        self.last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, _| scheduled.contains(id));
    }
}
