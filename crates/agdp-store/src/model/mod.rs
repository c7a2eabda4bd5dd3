//! Records held by the store and the payloads used to create or change them.

mod execution;
mod pipeline;
mod settings;

pub use execution::{Execution, ExecutionOutcome, LogEntry, NewExecution};
pub use pipeline::{Artifacts, Features, NewPipeline, Pipeline, UpdatePipeline};
pub use settings::{
    DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL, DEFAULT_STORAGE_PATH, Settings, UpdateSettings,
};
