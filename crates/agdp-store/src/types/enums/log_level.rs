//! Severity of an execution log entry.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Severity of a single execution log entry.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
pub enum LogLevel {
    /// Diagnostic detail
    #[serde(rename = "debug")]
    #[strum(serialize = "debug")]
    Debug,

    /// Regular progress message
    #[serde(rename = "info")]
    #[strum(serialize = "info")]
    #[default]
    Info,

    /// Something unexpected that did not stop the run
    #[serde(rename = "warning")]
    #[strum(serialize = "warning")]
    Warning,

    /// A failure
    #[serde(rename = "error")]
    #[strum(serialize = "error")]
    Error,

    /// Successful completion
    #[serde(rename = "success")]
    #[strum(serialize = "success")]
    Success,
}
