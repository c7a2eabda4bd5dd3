//! LLM-backed generator over an OpenAI-compatible chat-completions API.
//!
//! One completion is requested per artifact target. Any failure aborts the
//! whole generation, so a partial artifact set is never returned.

mod client;
mod config;
mod prompt;
mod response;

pub use client::LlmGenerator;
pub use config::{DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, LlmConfig};

/// Tracing target for LLM requests.
pub const TRACING_TARGET: &str = "agdp_generator::llm";
