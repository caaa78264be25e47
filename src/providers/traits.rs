use async_trait::async_trait;

use crate::error::ApiError;
use crate::llm::{ChatMessage, TokenUsage};

/// What an adapter hands back: completion text plus normalized token counts.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub content: String,
    pub tokens: TokenUsage,
}

/// A chat-completion backend. Two implementations: the hosted OpenAI API and
/// a local Ollama server.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Issue exactly one completion call. No retries at this layer.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: Option<u32>,
        temperature: f64,
    ) -> Result<BackendReply, ApiError>;

    /// Best-effort model listing: any failure is logged and yields an empty
    /// list rather than an error.
    async fn list_models(&self) -> Vec<String>;
}
