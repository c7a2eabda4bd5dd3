#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod provider;
mod request;
mod service;

pub mod llm;
pub mod template;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::provider::{CodeGenerator, GeneratorFactory, GeneratorProvider};
pub use crate::request::{ArtifactTarget, GenerationRequest};
pub use crate::service::GeneratorService;

/// Tracing target for generator selection and output validation.
pub const TRACING_TARGET: &str = "agdp_generator::service";
