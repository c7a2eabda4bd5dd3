//! All `aide::axum::`[`ApiRouter`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use agdp_server::handler::routes;
//! use agdp_server::middleware::{OpenApiConfig, RouterOpenApiExt};
//! use agdp_server::service::{ServiceConfig, ServiceState};
//! use axum::Router;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let state = ServiceState::from_config(&config)?;
//!
//! let router: Router = routes()
//!     .with_open_api(OpenApiConfig::default())
//!     .with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`ApiRouter`]: aide::axum::ApiRouter
//! [`Handler`]: axum::handler::Handler

mod error;
mod executions;
mod monitors;
mod pipelines;
pub mod request;
pub mod response;
mod settings;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound
        .with_message("No route matches the request")
        .into_response()
}

/// Returns an [`ApiRouter`] with all routes.
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(monitors::routes())
        .merge(pipelines::routes())
        .merge(executions::routes())
        .merge(settings::routes())
        .fallback(handler)
}

#[cfg(test)]
pub(crate) mod test {
    use std::time::Duration;

    use agdp_generator::GeneratorService;
    use agdp_generator::template::TemplateGenerator;
    use agdp_runtime::RuntimeConfig;
    use agdp_store::types::ExecutionStatus;
    use axum::Router;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::handler::response::{Execution, Pipeline};
    use crate::handler::routes;
    use crate::middleware::{OpenApiConfig, RouterOpenApiExt};
    use crate::service::{ServiceConfig, ServiceState};

    /// Returns a configuration whose executions finish within milliseconds.
    pub fn test_config() -> ServiceConfig {
        ServiceConfig {
            runtime: RuntimeConfig::default().with_step_delay_ms(5),
            ..ServiceConfig::default()
        }
    }

    /// Returns state that always generates from templates.
    pub fn create_test_state(config: &ServiceConfig) -> anyhow::Result<ServiceState> {
        let provider = GeneratorService::new(TemplateGenerator::new());
        Ok(ServiceState::with_provider(config, provider)?)
    }

    /// Returns a new [`TestServer`] with the default router and the given state.
    pub fn create_test_server_with_state(state: ServiceState) -> anyhow::Result<TestServer> {
        let app: Router = routes()
            .with_open_api(OpenApiConfig::default())
            .with_state(state);
        let server = TestServer::new(app)?;
        Ok(server)
    }

    /// Returns a new [`TestServer`] with the default router and state.
    pub fn create_test_server() -> anyhow::Result<TestServer> {
        let state = create_test_state(&test_config())?;
        create_test_server_with_state(state)
    }

    /// Creates a pipeline through the API.
    pub async fn create_pipeline(server: &TestServer, features: &[&str]) -> Pipeline {
        let response = server
            .post("/api/pipelines")
            .json(&json!({
                "name": "daily sales ETL",
                "prompt": "Load daily sales from CSV and aggregate revenue by region",
                "features": features,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Pipeline>()
    }

    /// Creates and generates a pipeline through the API.
    pub async fn create_generated_pipeline(server: &TestServer, features: &[&str]) -> Pipeline {
        let pipeline = create_pipeline(server, features).await;
        let response = server
            .post(&format!("/api/pipelines/{}/generate", pipeline.id))
            .await;
        response.assert_status_ok();
        response.json::<Pipeline>()
    }

    /// Polls an execution until it reaches a terminal status.
    pub async fn wait_for_terminal(server: &TestServer, execution_id: uuid::Uuid) -> Execution {
        let path = format!("/api/executions/{execution_id}");
        for _ in 0..200 {
            let execution = server.get(&path).await.json::<Execution>();
            if execution.status.is_terminal() {
                return execution;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("execution {execution_id} did not finish in time");
    }

    /// Polls an execution until it has the given status.
    pub async fn wait_for_status(
        server: &TestServer,
        execution_id: uuid::Uuid,
        status: ExecutionStatus,
    ) -> Execution {
        let path = format!("/api/executions/{execution_id}");
        for _ in 0..200 {
            let execution = server.get(&path).await.json::<Execution>();
            if execution.status == status {
                return execution;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("execution {execution_id} never reached {status}");
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let server = create_test_server()?;
        assert!(server.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/api/unknown").expect_failure().await;
        response.assert_status_not_found();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/api/openapi.json").await;
        response.assert_status_ok();
        let document = response.json::<serde_json::Value>();
        assert_eq!(document["info"]["title"], "AGDP API");
        assert!(document["paths"]["/api/pipelines/{pipelineId}"].is_object());
        assert!(document["paths"]["/api/executions/{executionId}/cancel"].is_object());
        Ok(())
    }
}
