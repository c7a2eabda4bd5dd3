//! Monitor response types.

use agdp_store::StoreStatus;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Liveness message returned by `GET /`.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Liveness {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Human-readable message.
    pub message: String,
}

impl Default for Liveness {
    fn default() -> Self {
        Self {
            status: "ok".to_owned(),
            message: "AGDP API is running".to_owned(),
        }
    }
}

/// System health response with component counts.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// Overall status; `ok` while the process serves requests.
    pub status: String,
    /// Application version.
    pub version: String,
    /// Timestamp when this status was generated.
    pub checked_at: Timestamp,
    /// Number of stored pipelines.
    pub pipelines: usize,
    /// Number of stored executions.
    pub executions: usize,
    /// Executions that are pending or running.
    pub active_executions: usize,
    /// Code generations in progress.
    pub running_generations: usize,
}

impl Health {
    /// Creates a health response from the store counters.
    pub fn new(store: StoreStatus, running_generations: usize) -> Self {
        Self {
            status: "ok".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            checked_at: Timestamp::now(),
            pipelines: store.pipelines,
            executions: store.executions,
            active_executions: store.active_executions,
            running_generations,
        }
    }
}
