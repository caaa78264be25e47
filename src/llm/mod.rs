pub mod dispatch;
pub mod types;

pub use dispatch::{BackendKind, Dispatcher, assemble_messages};
pub use types::{
    ChatMessage, Completion, CompletionRequest, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE, Role, TokenUsage,
};
