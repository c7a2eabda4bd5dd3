//! Execution engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use agdp_store::Store;
use agdp_store::model::{Execution, ExecutionOutcome, LogEntry, NewExecution};
use agdp_store::query::{ExecutionRepository, PipelineRepository, SettingsRepository};
use agdp_store::types::{ExecutionStatus, OffsetPagination, TriggerType};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::runner::{ArtifactRunner, ProcessRunner, RunContext, SimulatedRunner};
use crate::{Error, Result, RunnerKind, RuntimeConfig};

/// Tracing target for the execution engine.
const TRACING_TARGET: &str = "agdp_runtime::engine";

/// Reason recorded when a client cancels an execution.
const CANCELLED_BY_REQUEST: &str = "Cancelled by request";

/// Reason recorded when the engine shuts down with work in flight.
const CANCELLED_BY_SHUTDOWN: &str = "Server shutting down";

/// A slice of an execution log.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionLogs {
    /// Execution the entries belong to.
    pub execution_id: Uuid,
    /// Status at the time of the read.
    pub status: ExecutionStatus,
    /// Index of the first returned entry.
    pub since: usize,
    /// Index to pass as `since` for the next read.
    pub next: usize,
    /// Entries from `since` onwards.
    pub entries: Vec<LogEntry>,
}

struct EngineInner {
    store: Store,
    runner: Arc<dyn ArtifactRunner>,
    semaphore: Arc<Semaphore>,
    running: Mutex<HashMap<Uuid, CancellationToken>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

/// Starts, tracks and cancels executions.
///
/// [`start`](Self::start) records a pending execution and returns
/// immediately; a background task waits for a concurrency permit, moves the
/// execution to running and drives the configured [`ArtifactRunner`].
#[derive(Clone)]
pub struct ExecutionEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("runner", &self.inner.runner.name())
            .field("available_permits", &self.inner.semaphore.available_permits())
            .field("in_flight", &self.inner.tracker.len())
            .finish_non_exhaustive()
    }
}

impl ExecutionEngine {
    /// Creates an engine with the runner selected by the configuration.
    pub fn new(store: Store, config: &RuntimeConfig) -> Self {
        let runner: Arc<dyn ArtifactRunner> = match config.execution_runner {
            RunnerKind::Simulated => Arc::new(SimulatedRunner::new(config.step_delay())),
            RunnerKind::Process => Arc::new(ProcessRunner::new(&config.python_interpreter)),
        };
        Self::with_runner(store, runner, config.max_concurrent_executions)
    }

    /// Creates an engine with an explicit runner.
    pub fn with_runner(
        store: Store,
        runner: Arc<dyn ArtifactRunner>,
        max_concurrent_executions: usize,
    ) -> Self {
        tracing::info!(
            target: TRACING_TARGET,
            runner = runner.name(),
            max_concurrent_executions,
            "Execution engine created",
        );

        let inner = EngineInner {
            store,
            runner,
            semaphore: Arc::new(Semaphore::new(max_concurrent_executions.max(1))),
            running: Mutex::default(),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Starts an execution of a generated or scheduled pipeline.
    ///
    /// Returns the pending execution without waiting for it to run.
    pub async fn start(&self, pipeline_id: Uuid, trigger: TriggerType) -> Result<Execution> {
        if self.inner.shutdown.is_cancelled() {
            return Err(Error::InvalidState("the engine is shutting down".to_owned()));
        }

        let new_execution = NewExecution {
            pipeline_id,
            trigger,
        };
        let execution = self.inner.store.create_execution(new_execution).await?;

        let token = self.inner.shutdown.child_token();
        self.inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(execution.id, token.clone());

        let inner = self.inner.clone();
        let execution_id = execution.id;
        self.inner
            .tracker
            .spawn(async move { inner.drive(execution_id, token).await });

        tracing::info!(
            target: TRACING_TARGET,
            execution_id = %execution.id,
            pipeline_id = %pipeline_id,
            trigger = %trigger,
            "Execution started",
        );

        Ok(execution)
    }

    /// Cancels a pending or running execution.
    ///
    /// The execution is sealed as cancelled immediately and the worker is
    /// signalled to stop. Cancelling a terminal execution returns it
    /// unchanged.
    pub async fn cancel(&self, execution_id: Uuid) -> Result<Execution> {
        let execution = self.get(execution_id).await?;
        if execution.is_finished() {
            tracing::debug!(
                target: TRACING_TARGET,
                execution_id = %execution_id,
                status = %execution.status,
                "Cancel ignored for finished execution",
            );
            return Ok(execution);
        }

        let outcome = ExecutionOutcome::Cancelled(CANCELLED_BY_REQUEST.to_owned());
        let execution = self.inner.store.finish_execution(execution_id, outcome).await?;

        if let Some(token) = self
            .inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&execution_id)
        {
            token.cancel();
        }

        tracing::info!(
            target: TRACING_TARGET,
            execution_id = %execution_id,
            status = %execution.status,
            "Execution cancelled",
        );

        Ok(execution)
    }

    /// Returns an execution.
    pub async fn get(&self, execution_id: Uuid) -> Result<Execution> {
        self.inner
            .store
            .find_execution_by_id(execution_id)
            .await?
            .ok_or_else(|| Error::execution_not_found(execution_id))
    }

    /// Lists executions of a pipeline, newest first.
    pub async fn list_for_pipeline(
        &self,
        pipeline_id: Uuid,
        pagination: OffsetPagination,
    ) -> Result<Vec<Execution>> {
        let executions = self
            .inner
            .store
            .list_pipeline_executions(pipeline_id, pagination)
            .await?;
        Ok(executions)
    }

    /// Returns log entries starting at index `since`.
    ///
    /// The entries are always a prefix-consistent view: entries at the same
    /// index never change between reads.
    pub async fn logs(&self, execution_id: Uuid, since: usize) -> Result<ExecutionLogs> {
        let execution = self.get(execution_id).await?;
        let entries = execution.logs_since(since).to_vec();

        Ok(ExecutionLogs {
            execution_id,
            status: execution.status,
            since,
            next: execution.logs.len().max(since),
            entries,
        })
    }

    /// Returns the number of executions that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.inner
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Cancels all in-flight executions and waits for their workers.
    pub async fn shutdown(&self, timeout: Duration) {
        tracing::info!(
            target: TRACING_TARGET,
            in_flight = self.in_flight(),
            "Shutting down execution engine",
        );

        self.inner.shutdown.cancel();
        self.inner.tracker.close();

        if tokio::time::timeout(timeout, self.inner.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                target: TRACING_TARGET,
                timeout_secs = timeout.as_secs(),
                "Execution workers did not stop in time",
            );
        }
    }
}

impl EngineInner {
    /// Worker entry point for one execution.
    async fn drive(self: Arc<Self>, execution_id: Uuid, token: CancellationToken) {
        if let Err(error) = self.drive_inner(execution_id, &token).await {
            tracing::error!(
                target: TRACING_TARGET,
                execution_id = %execution_id,
                error = %error,
                "Execution worker failed",
            );
        }

        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&execution_id);
    }

    async fn drive_inner(&self, execution_id: Uuid, token: &CancellationToken) -> Result<()> {
        let permit = tokio::select! {
            biased;
            () = token.cancelled() => None,
            permit = self.semaphore.clone().acquire_owned() => permit.ok(),
        };
        let Some(_permit) = permit else {
            self.finish(execution_id, ExecutionOutcome::Cancelled(self.cancel_reason()))
                .await?;
            return Ok(());
        };

        let execution = match self.store.start_execution(execution_id).await {
            Ok(execution) => execution,
            // Cancelled while waiting for a permit.
            Err(agdp_store::StoreError::InvalidState(_)) => return Ok(()),
            Err(error) => return Err(error.into()),
        };

        let Some(pipeline) = self.store.find_pipeline_by_id(execution.pipeline_id).await? else {
            let outcome = ExecutionOutcome::Failed("pipeline no longer exists".to_owned());
            self.finish(execution_id, outcome).await?;
            return Ok(());
        };

        let settings = self.store.get_settings().await;
        let ctx = RunContext::new(
            self.store.clone(),
            pipeline,
            settings,
            execution_id,
            token.clone(),
        );

        let outcome = match self.runner.run(&ctx).await {
            _ if token.is_cancelled() => ExecutionOutcome::Cancelled(self.cancel_reason()),
            Ok(output) => ExecutionOutcome::Succeeded(output),
            Err(Error::Cancelled) => ExecutionOutcome::Cancelled(self.cancel_reason()),
            Err(Error::ExecutionFailed(cause)) => ExecutionOutcome::Failed(cause),
            Err(error) => ExecutionOutcome::Failed(error.to_string()),
        };

        self.finish(execution_id, outcome).await
    }

    async fn finish(&self, execution_id: Uuid, outcome: ExecutionOutcome) -> Result<()> {
        let execution = self.store.finish_execution(execution_id, outcome).await?;

        tracing::info!(
            target: TRACING_TARGET,
            execution_id = %execution_id,
            status = %execution.status,
            logs = execution.logs.len(),
            "Execution finished",
        );

        Ok(())
    }

    fn cancel_reason(&self) -> String {
        if self.shutdown.is_cancelled() {
            CANCELLED_BY_SHUTDOWN.to_owned()
        } else {
            CANCELLED_BY_REQUEST.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use agdp_store::model::{NewPipeline, Pipeline};

    use super::*;

    struct FailingRunner;

    #[async_trait::async_trait]
    impl ArtifactRunner for FailingRunner {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, ctx: &RunContext) -> Result<Option<String>> {
            ctx.info("Connecting to warehouse").await;
            Err(Error::execution_failed("warehouse unreachable"))
        }
    }

    async fn generated_pipeline(store: &Store) -> anyhow::Result<Pipeline> {
        let pipeline = store
            .create_pipeline(NewPipeline {
                name: "sales".into(),
                prompt: "daily sales ETL".into(),
                ..Default::default()
            })
            .await?;
        let artifacts = [("python".to_owned(), "print('ok')".to_owned())].into();
        let pipeline = store
            .store_pipeline_artifacts(pipeline.id, pipeline.revision, artifacts, "gpt-4".into())
            .await?;
        Ok(pipeline)
    }

    fn simulated(store: &Store, delay_ms: u64, max_concurrent: usize) -> ExecutionEngine {
        let runner = Arc::new(SimulatedRunner::new(Duration::from_millis(delay_ms)));
        ExecutionEngine::with_runner(store.clone(), runner, max_concurrent)
    }

    /// Polls until the execution satisfies `predicate`.
    async fn wait_for(
        engine: &ExecutionEngine,
        execution_id: Uuid,
        predicate: impl Fn(&Execution) -> bool,
    ) -> anyhow::Result<Execution> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let execution = engine.get(execution_id).await?;
            if predicate(&execution) {
                return Ok(execution);
            }
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("execution stuck in {}", execution.status);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn runs_to_success() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = generated_pipeline(&store).await?;
        let engine = simulated(&store, 10, 2);

        let execution = engine.start(pipeline.id, TriggerType::Manual).await?;
        assert_eq!(execution.status, ExecutionStatus::Pending);
        assert!(execution.finished_at.is_none());

        let mut seen = 0;
        let finished = loop {
            let current = engine.get(execution.id).await?;
            assert!(current.logs.len() >= seen);
            seen = current.logs.len();
            assert_eq!(current.finished_at.is_some(), current.status.is_terminal());
            if current.is_finished() {
                break current;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };

        assert_eq!(finished.status, ExecutionStatus::Succeeded);
        assert_eq!(
            finished.output.as_deref(),
            Some("Pipeline executed successfully. Processed 1000 rows.")
        );
        assert_eq!(engine.in_flight(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn draft_pipeline_is_invalid_state() -> anyhow::Result<()> {
        let store = Store::default();
        let draft = store
            .create_pipeline(NewPipeline {
                name: "draft".into(),
                prompt: "daily sales ETL".into(),
                ..Default::default()
            })
            .await?;
        let engine = simulated(&store, 0, 1);

        let result = engine.start(draft.id, TriggerType::Manual).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
        Ok(())
    }

    #[tokio::test]
    async fn cancel_is_idempotent() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = generated_pipeline(&store).await?;
        let engine = simulated(&store, 60_000, 1);

        let execution = engine.start(pipeline.id, TriggerType::Manual).await?;
        wait_for(&engine, execution.id, |e| e.status == ExecutionStatus::Running).await?;

        let cancelled = engine.cancel(execution.id).await?;
        assert_eq!(cancelled.status, ExecutionStatus::Cancelled);
        assert!(cancelled.finished_at.is_some());

        let again = engine.cancel(execution.id).await?;
        assert_eq!(again, cancelled);

        // The worker stops without adding further log lines.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while engine.in_flight() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(engine.get(execution.id).await?, cancelled);
        Ok(())
    }

    #[tokio::test]
    async fn runner_failure_marks_failed() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = generated_pipeline(&store).await?;
        let engine = ExecutionEngine::with_runner(store.clone(), Arc::new(FailingRunner), 1);

        let execution = engine.start(pipeline.id, TriggerType::Manual).await?;
        let failed = wait_for(&engine, execution.id, Execution::is_finished).await?;

        assert_eq!(failed.status, ExecutionStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("warehouse unreachable"));
        assert!(failed.logs.iter().any(|e| e.message == "Connecting to warehouse"));
        let last = failed.logs.last().map(|e| e.message.as_str());
        assert_eq!(last, Some("Execution failed: warehouse unreachable"));
        Ok(())
    }

    #[tokio::test]
    async fn concurrency_is_bounded() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = generated_pipeline(&store).await?;
        let engine = simulated(&store, 60_000, 1);

        let first = engine.start(pipeline.id, TriggerType::Manual).await?;
        let second = engine.start(pipeline.id, TriggerType::Manual).await?;
        wait_for(&engine, first.id, |e| e.status == ExecutionStatus::Running).await?;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.get(second.id).await?.status, ExecutionStatus::Pending);

        let cancelled = engine.cancel(second.id).await?;
        assert_eq!(cancelled.status, ExecutionStatus::Cancelled);

        engine.shutdown(Duration::from_secs(5)).await;
        let first = engine.get(first.id).await?;
        assert_eq!(first.status, ExecutionStatus::Cancelled);
        assert_eq!(first.error.as_deref(), Some(CANCELLED_BY_SHUTDOWN));
        Ok(())
    }

    #[tokio::test]
    async fn logs_since_index() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = generated_pipeline(&store).await?;
        let engine = simulated(&store, 0, 1);

        let execution = engine.start(pipeline.id, TriggerType::Manual).await?;
        let finished = wait_for(&engine, execution.id, Execution::is_finished).await?;

        let all = engine.logs(execution.id, 0).await?;
        assert_eq!(all.entries, finished.logs);
        assert_eq!(all.next, finished.logs.len());

        let tail = engine.logs(execution.id, 2).await?;
        assert_eq!(tail.entries, finished.logs[2..]);

        let past_end = engine.logs(execution.id, 1000).await?;
        assert!(past_end.entries.is_empty());
        assert_eq!(past_end.next, 1000);
        Ok(())
    }

    #[tokio::test]
    async fn start_after_shutdown_is_rejected() -> anyhow::Result<()> {
        let store = Store::default();
        let pipeline = generated_pipeline(&store).await?;
        let engine = simulated(&store, 0, 1);

        engine.shutdown(Duration::from_secs(1)).await;
        let result = engine.start(pipeline.id, TriggerType::Manual).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
        Ok(())
    }
}
