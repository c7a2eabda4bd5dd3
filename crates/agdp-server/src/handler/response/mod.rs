//! Response types for HTTP handlers.

mod errors;
mod executions;
mod monitors;
mod pipelines;
mod settings;

pub use errors::*;
pub use executions::*;
pub use monitors::*;
pub use pipelines::*;
pub use settings::*;
