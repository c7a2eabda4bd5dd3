//! Status and classification enumerations.

mod execution_status;
mod log_level;
mod pipeline_status;
mod trigger_type;

pub use execution_status::ExecutionStatus;
pub use log_level::LogLevel;
pub use pipeline_status::PipelineStatus;
pub use trigger_type::TriggerType;
