use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::scrub::{api_error, sanitize_api_error};
use super::traits::{Backend, BackendReply};
use crate::error::{ApiError, BackendError, ConfigError};
use crate::llm::{ChatMessage, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const BACKEND_NAME: &str = "OpenAI";

/// Hosted-API adapter. Requires a configured credential; fails with a config
/// error before any network call when none is set.
pub struct OpenAiBackend {
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAiBackend {
    pub fn new(api_key: Option<&str>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Base URL override, used by tests to point at a mock server.
    pub fn with_base_url(api_key: Option<&str>, base_url: &str) -> Self {
        Self {
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.cached_auth_header.is_some()
    }

    /// Completion with strict JSON output requested, for callers that will
    /// parse the reply as a structured object.
    pub async fn complete_json(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: Option<u32>,
        temperature: f64,
    ) -> Result<BackendReply, ApiError> {
        self.call(messages, model, max_tokens, temperature, true).await
    }

    async fn call(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: Option<u32>,
        temperature: f64,
        json_output: bool,
    ) -> Result<BackendReply, ApiError> {
        let request = ChatRequest {
            model,
            messages,
            max_tokens,
            temperature,
            response_format: json_output.then_some(ResponseFormat {
                r#type: "json_object",
            }),
        };
        let response = self.call_api(&request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(BackendError::Decode {
                backend: BACKEND_NAME,
                message: "no completion choices in response".to_string(),
            })?;

        // Usage is reported exactly; estimate only if the field is missing.
        let tokens = match response.usage {
            Some(usage) => {
                TokenUsage::exact(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens)
            }
            None => {
                let prompt_chars = serde_json::to_string(messages)
                    .map(|s| s.chars().count())
                    .unwrap_or(0);
                TokenUsage::estimated(prompt_chars, content.chars().count())
            }
        };

        Ok(BackendReply { content, tokens })
    }

    async fn call_api(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, ApiError> {
        let auth_header = self
            .cached_auth_header
            .as_ref()
            .ok_or(ConfigError::MissingApiKey)?;

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                backend: BACKEND_NAME,
                message: sanitize_api_error(&e.to_string()),
            })?;

        if !response.status().is_success() {
            return Err(api_error(BACKEND_NAME, response).await.into());
        }

        response.json().await.map_err(|e| {
            BackendError::Decode {
                backend: BACKEND_NAME,
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: Option<u32>,
        temperature: f64,
    ) -> Result<BackendReply, ApiError> {
        self.call(messages, model, max_tokens, temperature, false).await
    }

    async fn list_models(&self) -> Vec<String> {
        let Some(auth_header) = self.cached_auth_header.as_ref() else {
            tracing::debug!("skipping OpenAI model listing, no credential configured");
            return Vec::new();
        };

        let url = format!("{}/v1/models", self.base_url);
        let result = async {
            let response = self
                .client
                .get(&url)
                .header("Authorization", auth_header)
                .send()
                .await?
                .error_for_status()?;
            response.json::<ModelList>().await
        }
        .await;

        match result {
            Ok(list) => list.data.into_iter().map(|m| m.id).collect(),
            Err(e) => {
                tracing::warn!("failed to list OpenAI models: {}", sanitize_api_error(&e.to_string()));
                Vec::new()
            }
        }
    }
}
