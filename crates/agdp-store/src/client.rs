//! Shared store handle.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::TRACING_TARGET_CLIENT;
use crate::model::{Execution, Pipeline, Settings};

/// Record tables guarded by a single lock.
///
/// Pipelines and executions live under one lock so that cross-table checks
/// (e.g. "no active execution before delete") are atomic.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) pipelines: BTreeMap<Uuid, Pipeline>,
    pub(crate) executions: BTreeMap<Uuid, Execution>,
}

#[derive(Debug)]
struct StoreInner {
    tables: RwLock<Tables>,
    settings: RwLock<Settings>,
}

/// In-memory store for pipelines, executions and settings.
///
/// Cloning is cheap; all clones share the same tables. Every repository
/// operation runs inside a single critical section, so readers never
/// observe a half-applied update.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Record counts reported by [`Store::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    /// Number of stored pipelines, archived included.
    pub pipelines: usize,
    /// Number of stored executions.
    pub executions: usize,
    /// Number of pending or running executions.
    pub active_executions: usize,
}

impl Store {
    /// Creates an empty store seeded with the given settings.
    pub fn new(settings: Settings) -> Self {
        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            llm_model = %settings.llm_model,
            storage_path = %settings.storage_path.display(),
            has_llm_api_key = settings.has_llm_api_key(),
            "Store initialized",
        );

        let inner = StoreInner {
            tables: RwLock::new(Tables::default()),
            settings: RwLock::new(settings),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns record counts.
    pub async fn status(&self) -> StoreStatus {
        let tables = self.inner.tables.read().await;
        StoreStatus {
            pipelines: tables.pipelines.len(),
            executions: tables.executions.len(),
            active_executions: tables
                .executions
                .values()
                .filter(|execution| execution.status.is_active())
                .count(),
        }
    }

    #[inline]
    pub(crate) fn tables(&self) -> &RwLock<Tables> {
        &self.inner.tables
    }

    #[inline]
    pub(crate) fn settings(&self) -> &RwLock<Settings> {
        &self.inner.settings
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
