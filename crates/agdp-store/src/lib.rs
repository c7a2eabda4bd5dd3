#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for store lifecycle events.
pub const TRACING_TARGET_CLIENT: &str = "agdp_store::client";

/// Tracing target for repository operations.
///
/// Use this target for logging reads, writes and state transitions.
pub const TRACING_TARGET_QUERY: &str = "agdp_store::queries";

mod client;
mod error;
pub mod model;
pub mod query;
pub mod types;

pub use crate::client::{Store, StoreStatus};
pub use crate::error::{StoreError, StoreResult};
