use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::scrub::{api_error, sanitize_api_error};
use super::traits::{Backend, BackendReply};
use crate::error::{ApiError, BackendError};
use crate::llm::{ChatMessage, TokenUsage};

const BACKEND_NAME: &str = "Ollama";

/// Local-model adapter: talks to an Ollama server, no credential needed.
pub struct OllamaBackend {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagList {
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .connect_timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        _max_tokens: Option<u32>,
        temperature: f64,
    ) -> Result<BackendReply, ApiError> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: Options { temperature },
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                backend: BACKEND_NAME,
                message: sanitize_api_error(&e.to_string()),
            })?;

        if !response.status().is_success() {
            return Err(api_error(BACKEND_NAME, response).await.into());
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| BackendError::Decode {
                backend: BACKEND_NAME,
                message: e.to_string(),
            })?;

        // Ollama does not report token usage, so estimate from character
        // counts of the serialized request messages and the reply.
        let prompt_chars = serde_json::to_string(messages)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        let content = chat_response.message.content;
        let tokens = TokenUsage::estimated(prompt_chars, content.chars().count());

        Ok(BackendReply { content, tokens })
    }

    async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);
        let result = async {
            let response = self.client.get(&url).send().await?.error_for_status()?;
            response.json::<TagList>().await
        }
        .await;

        match result {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                tracing::warn!("failed to list Ollama models: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = OllamaBackend::new("http://192.168.1.100:11434/");
        assert_eq!(backend.base_url, "http://192.168.1.100:11434");
    }

    #[test]
    fn request_serializes_stream_off() {
        let messages = [ChatMessage::system("sys"), ChatMessage::user("hello")];
        let request = ChatRequest {
            model: "llama2",
            messages: &messages,
            stream: false,
            options: Options { temperature: 0.7 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["model"], "llama2");
        assert_eq!(json["options"]["temperature"], 0.7);
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn response_deserializes() {
        let json = r#"{"model":"llama2","message":{"role":"assistant","content":"Hello!"},"done":true}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.message.content, "Hello!");
    }

    #[test]
    fn tag_list_deserializes() {
        let json = r#"{"models":[{"name":"llama2:latest","size":123},{"name":"mistral:7b"}]}"#;
        let tags: TagList = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = tags.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["llama2:latest", "mistral:7b"]);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Reserved TEST-NET-1 address, nothing listens there
        let backend = OllamaBackend::new("http://192.0.2.1:1");
        let messages = [ChatMessage::user("hi")];
        let err = backend.complete(&messages, "llama2", None, 0.7).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn unreachable_server_lists_no_models() {
        let backend = OllamaBackend::new("http://192.0.2.1:1");
        assert!(backend.list_models().await.is_empty());
    }
}
