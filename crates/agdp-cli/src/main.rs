#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use agdp_server::handler::routes;
use agdp_server::middleware::{
    RouterObservabilityExt, RouterOpenApiExt, RouterRecoveryExt, RouterSecurityExt,
    SecurityHeadersConfig,
};
use agdp_server::service::ServiceState;
use agdp_server::worker::Workers;
use anyhow::Context;
use axum::Router;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "agdp_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "agdp_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "agdp_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting agdp server"
    );

    cli.log();
    cli.validate()?;

    let state =
        ServiceState::from_config(&cli.service).context("failed to create service state")?;
    let workers = Workers::spawn(&state);
    let router = create_router(state, &cli.middleware);

    let served = server::serve(router, &cli.server).await;
    workers.shutdown(cli.server.shutdown_timeout()).await;

    served.map_err(|err| {
        err.log();
        anyhow::Error::new(err)
    })
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs, tracing spans and timing
/// 3. Security - CORS, security headers, compression
/// 4. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    let api_routes: Router = routes()
        .with_open_api(middleware.openapi.clone())
        .with_state(state);

    api_routes
        .with_security(&middleware.cors, &SecurityHeadersConfig::default())
        .with_metrics()
        .with_observability()
        .with_recovery(&middleware.recovery)
}
