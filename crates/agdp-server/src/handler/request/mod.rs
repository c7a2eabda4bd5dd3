//! Request types for HTTP handlers.

mod executions;
mod paginations;
mod paths;
mod pipelines;
mod settings;

pub use executions::*;
pub use paginations::*;
pub use paths::*;
pub use pipelines::*;
pub use settings::*;
