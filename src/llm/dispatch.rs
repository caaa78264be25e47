use std::sync::Arc;

use crate::error::ApiError;
use crate::llm::types::{ChatMessage, Completion, CompletionRequest};
use crate::providers::{Backend, OllamaBackend, OpenAiBackend};

/// Model-name prefixes that route to the hosted backend. Anything else is
/// assumed to be a model served by the local Ollama instance.
const HOSTED_MODEL_PREFIXES: [&str; 3] = ["gpt-", "claude-", "openai/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hosted,
    Local,
}

impl BackendKind {
    /// Pure string-prefix rule, not capability discovery. An unrecognized
    /// model name silently routes to the local backend.
    pub fn for_model(model: &str) -> Self {
        if HOSTED_MODEL_PREFIXES.iter().any(|p| model.starts_with(p)) {
            Self::Hosted
        } else {
            Self::Local
        }
    }
}

/// Build the ordered message list for a completion request: system prompt
/// first when present, then history verbatim, then the current prompt as a
/// user turn.
pub fn assemble_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    let history_len = request.history.as_ref().map_or(0, Vec::len);
    let mut messages = Vec::with_capacity(history_len + 2);

    if let Some(system) = &request.system_prompt {
        messages.push(ChatMessage::system(system.clone()));
    }
    if let Some(history) = &request.history {
        messages.extend(history.iter().cloned());
    }
    messages.push(ChatMessage::user(request.prompt.clone()));

    messages
}

/// Routes a completion request to one of the two backends.
///
/// One outbound call per invocation. There is no fallback at this layer; the
/// family synthesizers implement their own hosted-then-local chain.
#[derive(Clone)]
pub struct Dispatcher {
    pub openai: Arc<OpenAiBackend>,
    pub ollama: Arc<OllamaBackend>,
}

impl Dispatcher {
    pub fn new(openai: Arc<OpenAiBackend>, ollama: Arc<OllamaBackend>) -> Self {
        Self { openai, ollama }
    }

    pub async fn dispatch(&self, request: &CompletionRequest) -> Result<Completion, ApiError> {
        let messages = assemble_messages(request);

        let backend: &dyn Backend = match BackendKind::for_model(&request.model) {
            BackendKind::Hosted => self.openai.as_ref(),
            BackendKind::Local => self.ollama.as_ref(),
        };
        tracing::debug!(model = %request.model, backend = backend.name(), "dispatching completion");

        let temperature = request.temperature.unwrap_or(crate::llm::DEFAULT_TEMPERATURE);
        let reply = backend
            .complete(&messages, &request.model, request.max_tokens, temperature)
            .await?;

        Ok(Completion {
            content: reply.content,
            model: request.model.clone(),
            tokens: reply.tokens,
        })
    }
}
