//! Middleware for `axum::Router` and HTTP request processing.
//!
//! This module provides the middleware stack applied around the API routes:
//! - Security (CORS, security headers, body limits, compression)
//! - Observability (request IDs, tracing spans, request timing)
//! - Recovery (panics, timeouts, service errors)
//! - OpenAPI documentation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aide::axum::ApiRouter;
//! use axum::Router;
//! use agdp_server::middleware::{
//!     OpenApiConfig, RouterObservabilityExt, RouterOpenApiExt, RouterRecoveryExt,
//!     RouterSecurityExt,
//! };
//!
//! let app: Router = ApiRouter::new()
//!     .with_open_api(OpenApiConfig::default())
//!     .with_default_security()
//!     .with_observability()
//!     .with_default_recovery();
//! ```

mod observability;
mod recovery;
mod security;
mod specification;

pub use observability::{RouterObservabilityExt, track_request_timing};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{
    CorsConfig, FrameOptions, ReferrerPolicy, RouterSecurityExt, SecurityHeadersConfig,
};
pub use specification::{OpenApiConfig, RouterOpenApiExt};

/// Maximum accepted request body size: prompts are capped well below this.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;
