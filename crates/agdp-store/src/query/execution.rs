//! Execution repository.

use std::future::Future;

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{Execution, ExecutionOutcome, LogEntry, NewExecution};
use crate::types::{ExecutionStatus, OffsetPagination};
use crate::{Store, StoreError, StoreResult, TRACING_TARGET_QUERY};

/// Repository for execution records.
///
/// Executions move through `pending -> running -> terminal`. Once terminal
/// an execution is sealed: log appends are dropped and further transitions
/// return the record unchanged.
pub trait ExecutionRepository {
    /// Creates a pending execution for an executable pipeline.
    fn create_execution(
        &self,
        new_execution: NewExecution,
    ) -> impl Future<Output = StoreResult<Execution>> + Send;

    /// Finds an execution by its unique identifier.
    fn find_execution_by_id(
        &self,
        execution_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Execution>>> + Send;

    /// Lists executions of a pipeline, newest first.
    fn list_pipeline_executions(
        &self,
        pipeline_id: Uuid,
        pagination: OffsetPagination,
    ) -> impl Future<Output = StoreResult<Vec<Execution>>> + Send;

    /// Lists pending and running executions.
    fn list_active_executions(&self) -> impl Future<Output = StoreResult<Vec<Execution>>> + Send;

    /// Returns whether the pipeline has a pending or running execution.
    fn has_active_execution(
        &self,
        pipeline_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Moves a pending execution to running.
    fn start_execution(
        &self,
        execution_id: Uuid,
    ) -> impl Future<Output = StoreResult<Execution>> + Send;

    /// Appends a log entry.
    ///
    /// Returns `false` when the execution is already terminal and the entry
    /// was dropped.
    fn append_execution_log(
        &self,
        execution_id: Uuid,
        entry: LogEntry,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Moves an execution to a terminal status.
    ///
    /// Finishing an already terminal execution is a no-op that returns the
    /// existing record.
    fn finish_execution(
        &self,
        execution_id: Uuid,
        outcome: ExecutionOutcome,
    ) -> impl Future<Output = StoreResult<Execution>> + Send;
}

impl ExecutionRepository for Store {
    async fn create_execution(&self, new_execution: NewExecution) -> StoreResult<Execution> {
        let mut tables = self.tables().write().await;
        let pipeline = tables
            .pipelines
            .get(&new_execution.pipeline_id)
            .ok_or_else(|| StoreError::pipeline_not_found(new_execution.pipeline_id))?;

        if !pipeline.is_executable() {
            return Err(StoreError::invalid_state(format!(
                "pipeline is {}; only generated or scheduled pipelines can be executed",
                pipeline.status
            )));
        }

        let execution = Execution {
            id: Uuid::now_v7(),
            pipeline_id: new_execution.pipeline_id,
            trigger: new_execution.trigger,
            status: ExecutionStatus::Pending,
            logs: vec![LogEntry::info(format!(
                "Execution queued ({} trigger)",
                new_execution.trigger
            ))],
            output: None,
            error: None,
            started_at: Timestamp::now(),
            running_at: None,
            finished_at: None,
        };

        tables.executions.insert(execution.id, execution.clone());

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            execution_id = %execution.id,
            pipeline_id = %execution.pipeline_id,
            trigger = %execution.trigger,
            "Execution created",
        );

        Ok(execution)
    }

    async fn find_execution_by_id(&self, execution_id: Uuid) -> StoreResult<Option<Execution>> {
        let tables = self.tables().read().await;
        Ok(tables.executions.get(&execution_id).cloned())
    }

    async fn list_pipeline_executions(
        &self,
        pipeline_id: Uuid,
        pagination: OffsetPagination,
    ) -> StoreResult<Vec<Execution>> {
        let tables = self.tables().read().await;
        if !tables.pipelines.contains_key(&pipeline_id) {
            return Err(StoreError::pipeline_not_found(pipeline_id));
        }

        // Ids are v7, so reverse key order is newest first.
        let executions = tables
            .executions
            .values()
            .rev()
            .filter(|execution| execution.pipeline_id == pipeline_id)
            .cloned();

        Ok(pagination.apply(executions))
    }

    async fn list_active_executions(&self) -> StoreResult<Vec<Execution>> {
        let tables = self.tables().read().await;
        let executions = tables
            .executions
            .values()
            .filter(|execution| execution.status.is_active())
            .cloned()
            .collect();

        Ok(executions)
    }

    async fn has_active_execution(&self, pipeline_id: Uuid) -> StoreResult<bool> {
        let tables = self.tables().read().await;
        Ok(tables
            .executions
            .values()
            .any(|execution| execution.pipeline_id == pipeline_id && execution.status.is_active()))
    }

    async fn start_execution(&self, execution_id: Uuid) -> StoreResult<Execution> {
        let mut tables = self.tables().write().await;
        let execution = tables
            .executions
            .get_mut(&execution_id)
            .ok_or_else(|| StoreError::execution_not_found(execution_id))?;

        if execution.status != ExecutionStatus::Pending {
            return Err(StoreError::invalid_state(format!(
                "execution is {}; only pending executions can start",
                execution.status
            )));
        }

        execution.status = ExecutionStatus::Running;
        execution.running_at = Some(Timestamp::now());
        execution.logs.push(LogEntry::info("Execution started"));

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            execution_id = %execution_id,
            "Execution running",
        );

        Ok(execution.clone())
    }

    async fn append_execution_log(&self, execution_id: Uuid, entry: LogEntry) -> StoreResult<bool> {
        let mut tables = self.tables().write().await;
        let execution = tables
            .executions
            .get_mut(&execution_id)
            .ok_or_else(|| StoreError::execution_not_found(execution_id))?;

        if execution.is_finished() {
            return Ok(false);
        }

        execution.logs.push(entry);
        Ok(true)
    }

    async fn finish_execution(
        &self,
        execution_id: Uuid,
        outcome: ExecutionOutcome,
    ) -> StoreResult<Execution> {
        let mut tables = self.tables().write().await;
        let execution = tables
            .executions
            .get_mut(&execution_id)
            .ok_or_else(|| StoreError::execution_not_found(execution_id))?;

        if execution.is_finished() {
            return Ok(execution.clone());
        }

        // Only cancellation may skip the running state.
        let status = outcome.status();
        if execution.status == ExecutionStatus::Pending && status != ExecutionStatus::Cancelled {
            return Err(StoreError::invalid_state(format!(
                "pending executions cannot become {status}"
            )));
        }

        execution.logs.push(outcome.log_entry());
        execution.status = status;
        execution.finished_at = Some(Timestamp::now());
        match outcome {
            ExecutionOutcome::Succeeded(output) => execution.output = output,
            ExecutionOutcome::Failed(cause) | ExecutionOutcome::Cancelled(cause) => {
                execution.error = Some(cause)
            }
        }

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            execution_id = %execution_id,
            status = %execution.status,
            logs = execution.logs.len(),
            "Execution finished",
        );

        Ok(execution.clone())
    }
}
