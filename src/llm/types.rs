use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn. Ordering of a message sequence is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Wire request for `POST /api/llm/chat`.
///
/// `model` doubles as the backend-selection key and the literal model
/// identifier passed to the chosen backend.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature. Absent or `null` means the dispatcher applies
    /// [`DEFAULT_TEMPERATURE`].
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> Option<u32> {
    Some(DEFAULT_MAX_TOKENS)
}

/// Token accounting for one completion. Exact when the backend reports usage,
/// estimated from character counts otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn exact(prompt: u64, completion: u64, total: u64) -> Self {
        Self {
            prompt,
            completion,
            total,
        }
    }

    /// Rough estimate at four characters per token.
    ///
    /// `total` is computed from the combined character count, so it is not
    /// necessarily `prompt + completion` once each half has been rounded
    /// down. That mirrors how the counts have always been reported.
    pub fn estimated(prompt_chars: usize, completion_chars: usize) -> Self {
        Self {
            prompt: (prompt_chars / 4) as u64,
            completion: (completion_chars / 4) as u64,
            total: ((prompt_chars + completion_chars) / 4) as u64,
        }
    }
}

/// Wire response for `POST /api/llm/chat`. `model` echoes the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub tokens: TokenUsage,
}
