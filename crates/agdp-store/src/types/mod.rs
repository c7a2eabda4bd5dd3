//! Enumerations, schedules and other custom types.

mod cron;
mod enums;
mod pagination;

pub use cron::{CronSchedule, ParseCronError};
pub use enums::{ExecutionStatus, LogLevel, PipelineStatus, TriggerType};
pub use pagination::{MAX_LIMIT, OffsetPagination};
