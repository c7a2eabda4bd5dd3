//! Chat-completions client implementing [`CodeGenerator`].

use std::fmt;

use agdp_store::model::Artifacts;
use reqwest::{Client, StatusCode};
use url::Url;

use super::prompt::{SYSTEM_PROMPT, user_prompt};
use super::response::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse, strip_code_fence};
use super::{LlmConfig, TRACING_TARGET};
use crate::{ArtifactTarget, CodeGenerator, Error, ErrorKind, GenerationRequest, Result};

/// Generator backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmGenerator {
    http: Client,
    config: LlmConfig,
    endpoint: Url,
    api_key: String,
}

impl fmt::Debug for LlmGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmGenerator")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LlmGenerator {
    /// Creates a generator for the API rooted at `base_url`.
    pub fn new(http: Client, config: LlmConfig, base_url: &str, api_key: &str) -> Result<Self> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join("chat/completions"))
            .map_err(|e| {
                Error::from_source(ErrorKind::Configuration, e)
                    .with_message(format!("Invalid LLM base URL: {base_url}"))
            })?;

        Ok(Self {
            http,
            config,
            endpoint,
            api_key: api_key.to_owned(),
        })
    }

    /// Returns the chat-completions endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn complete(&self, target: ArtifactTarget, request: &GenerationRequest) -> Result<String> {
        let user = user_prompt(target, request);
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.config.effective_temperature(),
            max_tokens: self.config.llm_max_tokens,
        };

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %self.endpoint,
            model = %request.model,
            artifact = %target,
            "Requesting completion",
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(status_error(status, &detail));
        }

        let content = response
            .json::<ChatResponse>()
            .await?
            .into_content()
            .unwrap_or_default();
        let source = strip_code_fence(&content);
        if source.is_empty() {
            return Err(Error::new(ErrorKind::InvalidResponse)
                .with_message(format!("Model returned an empty {target} artifact")));
        }

        Ok(source.to_owned())
    }
}

/// Maps a non-success status to an error kind.
fn status_error(status: StatusCode, detail: &str) -> Error {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Authentication,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => ErrorKind::Configuration,
        status if status.is_server_error() => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::ExternalError,
    };

    Error::new(kind).with_message(format!("Model endpoint returned {status}: {detail}"))
}

#[async_trait::async_trait]
impl CodeGenerator for LlmGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Artifacts> {
        let mut artifacts = Artifacts::new();
        for target in request.targets() {
            let source = self.complete(target, request).await?;
            artifacts.insert(target.to_string(), source);
        }

        Ok(artifacts)
    }
}
