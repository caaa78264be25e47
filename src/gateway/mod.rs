//! Axum HTTP gateway: routing, CORS, body limits, and request timeouts.

mod handlers;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::Config;
use crate::llm::Dispatcher;
use crate::providers::{OllamaBackend, OpenAiBackend};

/// Maximum request body size (64KB).
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout. Generous because a local model on modest hardware can
/// take most of its own 60s budget to answer.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Shared state for all handlers: the two backend adapters behind the
/// dispatcher, plus the environment name echoed by `/health`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub environment: String,
}

impl AppState {
    pub fn new(
        openai: Arc<OpenAiBackend>,
        ollama: Arc<OllamaBackend>,
        environment: String,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(openai, ollama),
            environment,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(OpenAiBackend::new(config.openai_api_key.as_deref())),
            Arc::new(OllamaBackend::new(&config.ollama_url)),
            config.environment.clone(),
        )
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::handle_root))
        .route("/health", get(handlers::handle_health))
        .route("/api/llm/chat", post(handlers::handle_chat))
        .route("/api/llm/models", get(handlers::handle_models))
        .route(
            "/api/family/activity-suggestions",
            post(handlers::handle_activity_suggestions),
        )
        .route(
            "/api/family/schedule-help",
            post(handlers::handle_schedule_help),
        )
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        // Wildcard origins cannot carry credentials
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(list))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    }
}

/// Bind `host:port` from the config and run the gateway.
pub async fn serve(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_with_listener(listener, config).await
}

/// Run the gateway from a pre-bound listener (used by integration tests).
pub async fn serve_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, environment = %config.environment, "gateway listening");

    let app = router(AppState::from_config(&config), &config.cors_origins);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_is_64kb() {
        assert_eq!(MAX_BODY_SIZE, 65_536);
    }

    #[test]
    fn wildcard_cors_builds() {
        let _ = cors_layer(&["*".to_string()]);
    }

    #[test]
    fn explicit_cors_builds() {
        let _ = cors_layer(&[
            "http://localhost:5173".to_string(),
            "https://dashboard.example.com".to_string(),
        ]);
    }

    #[test]
    fn router_builds_from_default_config() {
        let config = Config::default();
        let _ = router(AppState::from_config(&config), &config.cors_origins);
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
