//! Request extractors with API-shaped rejections.
//!
//! - [`Json`] - JSON body deserialization
//! - [`ValidateJson`] - JSON body deserialization followed by `validator` checks
//! - [`Path`] - path parameter extraction
//! - [`Query`] - query string extraction
//!
//! Every rejection is converted into a [`handler::Error`] so clients always
//! receive the same error body.
//!
//! [`handler::Error`]: crate::handler::Error

pub mod reject;

pub use crate::extract::reject::{Json, Path, Query, ValidateJson};
