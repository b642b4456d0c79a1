use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::providers::Provider;

/// Shared state for the request handlers: one provider, chosen at startup.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<Provider>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            provider: Arc::new(Provider::from_config(config)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct StatusResponse {
    message: &'static str,
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Brampton Finance AI backend is running!",
    })
}

/// One user turn in, one reply out. Provider failures never fail the HTTP
/// exchange; the caller gets an apologetic reply string instead, so the chat
/// surface stays conversational whatever happens behind the backend.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let response = match state.provider.reply(&request.message).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(provider = state.provider.name(), error = %err, "provider call failed");
            format!(
                "Sorry, I'm having trouble reaching the {} model right now. \
                 Please make sure it is available and try again.",
                state.provider.name()
            )
        }
    };

    Json(ChatResponse { response })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/api/chat", post(chat))
        // Browser frontends call in from another origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let addr = config.listen_addr();
    let state = AppState::new(&config);
    tracing::info!(provider = state.provider.name(), "provider selected");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Brampton backend listening on http://{addr}");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        // Port 9 (discard) is never running an Ollama; provider calls fail fast.
        let config = Config {
            ollama_url: Some("http://127.0.0.1:9".to_string()),
            ..Config::new()
        };
        AppState::new(&config)
    }

    #[tokio::test]
    async fn test_status_route_reports_running() {
        let response = router(test_state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Brampton Finance AI backend is running!");
    }

    #[tokio::test]
    async fn test_chat_masks_provider_failure_as_reply() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message": "What is a stock?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let reply = body["response"].as_str().unwrap();
        assert!(reply.contains("Ollama"));
    }

    #[tokio::test]
    async fn test_chat_rejects_body_without_message() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
