#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod engine;
mod error;
mod generation;
mod scheduler;

pub mod runner;

pub use crate::config::{RunnerKind, RuntimeConfig};
pub use crate::engine::{ExecutionEngine, ExecutionLogs};
pub use crate::error::{Error, Result};
pub use crate::generation::GenerationService;
pub use crate::scheduler::Scheduler;
