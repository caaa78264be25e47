use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Top-level error for gateway operations.
///
/// Handlers surface these as HTTP 500 with the message embedded. Parse
/// failures deliberately live outside this hierarchy: see [`ParseError`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OpenAI API key not configured. Set OPENAI_API_KEY.")]
    MissingApiKey,
}

/// Failure from one of the two completion backends. The message has already
/// been through [`crate::providers::sanitize_api_error`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{backend} request failed: {message}")]
    Transport {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} API error ({status}): {message}")]
    Api {
        backend: &'static str,
        status: u16,
        message: String,
    },

    #[error("{backend} response could not be decoded: {message}")]
    Decode {
        backend: &'static str,
        message: String,
    },
}

/// Backend text was not the JSON shape a synthesizer asked for.
///
/// Never converted into [`ApiError`]: the synthesizers recover from it
/// locally by substituting a canned default, so it cannot reach a handler.
#[derive(Debug, Error)]
#[error("response was not the expected JSON shape: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
