use axum::extract::State;
use axum::response::{IntoResponse, Json};

use super::AppState;
use crate::error::ApiError;
use crate::family::{
    ActivityRequest, ActivityResponse, ScheduleRequest, ScheduleResponse, analyze_schedule,
    suggest_activities,
};
use crate::llm::{Completion, CompletionRequest};
use crate::providers::Backend;

/// GET / — service banner.
pub(super) async fn handle_root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the Hearthboard LLM gateway",
        "docs_url": "/docs",
        "health_check": "/health",
    }))
}

/// GET /health — always 200, regardless of backend availability.
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
    }))
}

/// POST /api/llm/chat — single dispatch, no fallback: a backend failure is a
/// 500 with the upstream text embedded.
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<Completion>, ApiError> {
    tracing::info!(model = %request.model, "LLM chat request received");

    state
        .dispatcher
        .dispatch(&request)
        .await
        .map(Json)
        .inspect_err(|e| tracing::error!("chat completion failed: {e}"))
}

/// GET /api/llm/models — best-effort listing from both backends; unreachable
/// backends contribute empty arrays, never an error.
pub(super) async fn handle_models(State(state): State<AppState>) -> impl IntoResponse {
    let (openai, ollama) = tokio::join!(
        state.dispatcher.openai.list_models(),
        state.dispatcher.ollama.list_models(),
    );
    Json(serde_json::json!({ "openai": openai, "ollama": ollama }))
}

/// POST /api/family/activity-suggestions — 500 only when both backend calls
/// themselves fail.
pub(super) async fn handle_activity_suggestions(
    State(state): State<AppState>,
    Json(request): Json<ActivityRequest>,
) -> Result<Json<ActivityResponse>, ApiError> {
    tracing::info!("generating family activity suggestions");

    suggest_activities(&state.dispatcher.openai, &state.dispatcher.ollama, &request)
        .await
        .map(Json)
        .inspect_err(|e| tracing::error!("activity suggestions failed: {e}"))
}

/// POST /api/family/schedule-help — hosted backend only, 500 on failure.
pub(super) async fn handle_schedule_help(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    tracing::info!("analyzing family schedule");

    analyze_schedule(&state.dispatcher.openai, &request)
        .await
        .map(Json)
        .inspect_err(|e| tracing::error!("schedule analysis failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Arc;

    use crate::providers::{OllamaBackend, OpenAiBackend};

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(OpenAiBackend::new(None)),
            Arc::new(OllamaBackend::new("http://localhost:11434")),
            "test".to_string(),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_status_and_environment() {
        let response = handle_health(State(test_state())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["environment"], "test");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn root_links_docs_and_health() {
        let response = handle_root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["health_check"], "/health");
        assert_eq!(json["docs_url"], "/docs");
    }

    #[tokio::test]
    async fn chat_without_credential_is_500_for_hosted_model() {
        let request: CompletionRequest =
            serde_json::from_str(r#"{"prompt":"hi","model":"gpt-4"}"#).unwrap();
        let result = handle_chat(State(test_state()), Json(request)).await;
        let response = result.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }
}
