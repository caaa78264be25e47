pub mod ollama;
pub mod openai;
pub mod scrub;
pub mod traits;

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use scrub::{api_error, sanitize_api_error};
pub use traits::{Backend, BackendReply};
