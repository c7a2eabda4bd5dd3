//! Repository traits implemented by [`Store`].
//!
//! Each trait groups the operations for one record type. Every operation
//! runs inside a single critical section of the store, so multi-record
//! rules (such as refusing to delete a pipeline with an active execution)
//! are checked and applied atomically.
//!
//! [`Store`]: crate::Store

mod execution;
mod pipeline;
mod settings;

pub use execution::ExecutionRepository;
pub use pipeline::PipelineRepository;
pub use settings::SettingsRepository;
