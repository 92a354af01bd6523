//! HTTP surface: thin axum plumbing around the agent loop and session store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::agent::Agent;
use crate::error::{ColloquyError, Result};
use crate::llm::ModelClient;
use crate::message::Usage;
use crate::session::{InMemorySessionStore, SessionGates, SessionStore, Transcript};

/// Ties the agent, the session store, and the per-session gates together.
pub struct ChatService<M: ModelClient> {
    agent: Agent<M>,
    sessions: Arc<dyn SessionStore>,
    gates: SessionGates,
}

impl<M: ModelClient> ChatService<M> {
    pub fn new(agent: Agent<M>) -> Self {
        Self {
            agent,
            sessions: Arc::new(InMemorySessionStore::new()),
            gates: SessionGates::new(),
        }
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Run one agent-loop invocation for `session_id`. Holds the session
    /// gate for the duration, so invocations for one session never overlap.
    pub async fn chat(&self, session_id: &str, message: String) -> Result<ChatReply> {
        let _gate = self.gates.lock(session_id).await;
        let outcome = self
            .agent
            .run(self.sessions.as_ref(), session_id, message)
            .await?;
        Ok(ChatReply {
            response: outcome.reply,
            session_id: session_id.to_string(),
            usage: outcome.usage,
            iterations: outcome.iterations,
        })
    }

    pub async fn history(&self, session_id: &str) -> Result<Transcript> {
        self.sessions
            .get(session_id)
            .await
            .ok_or_else(|| ColloquyError::NotFound(session_id.to_string()))
    }

    pub async fn clear(&self, session_id: &str) -> Result<()> {
        if self.sessions.delete(session_id).await {
            self.gates.remove(session_id).await;
            Ok(())
        } else {
            Err(ColloquyError::NotFound(session_id.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    pub usage: Usage,
    pub iterations: u32,
}

impl IntoResponse for ColloquyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ColloquyError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ColloquyError::NotFound(_) => (StatusCode::NOT_FOUND, "Session not found".to_string()),
            ColloquyError::IterationLimit(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Agent loop exceeded maximum iterations".to_string(),
            ),
            ColloquyError::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get response from LLM".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({"error": message}))).into_response()
    }
}

pub fn router<M: ModelClient + 'static>(service: ChatService<M>) -> Router {
    let state = Arc::new(service);
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/chat", post(chat::<M>))
        .route("/chat/:session_id", get(history::<M>).delete(clear::<M>))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<M: ModelClient + 'static>(
    service: ChatService<M>,
    addr: SocketAddr,
) -> Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"})))
}

async fn chat<M: ModelClient + 'static>(
    State(state): State<Arc<ChatService<M>>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    let message = match req.message {
        Some(message) if !message.is_empty() => message,
        _ => return Err(ColloquyError::Validation("Message is required".into())),
    };
    let session_id = req.session_id.unwrap_or_else(|| "default".to_string());
    tracing::info!(session_id = %session_id, "chat request");

    let reply = state.chat(&session_id, message).await?;
    Ok(Json(reply))
}

#[derive(Debug, Serialize)]
struct SessionHistory {
    session_id: String,
    messages: Transcript,
}

async fn history<M: ModelClient + 'static>(
    State(state): State<Arc<ChatService<M>>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistory>> {
    let messages = state.history(&session_id).await?;
    Ok(Json(SessionHistory {
        session_id,
        messages,
    }))
}

async fn clear<M: ModelClient + 'static>(
    State(state): State<Arc<ChatService<M>>>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.clear(&session_id).await?;
    Ok(Json(json!({"message": format!("Session {session_id} cleared")})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use crate::message::{ContentBlock, ModelResponse, StopReason};

    fn scripted_service(responses: Vec<ModelResponse>) -> ChatService<ScriptedModel> {
        ChatService::new(Agent::new(Arc::new(ScriptedModel::new(responses))))
    }

    fn end_turn(text: &str) -> ModelResponse {
        ModelResponse {
            content: vec![ContentBlock::Text { text: text.into() }],
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 1,
                output_tokens: 2,
            },
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_message_maps_to_400() {
        let service = scripted_service(vec![]);
        let response = chat(
            State(Arc::new(service)),
            Json(ChatRequest {
                message: None,
                session_id: None,
            }),
        )
        .await
        .unwrap_err()
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn chat_defaults_to_the_default_session() {
        let service = Arc::new(scripted_service(vec![end_turn("Hello")]));
        let Json(reply) = chat(
            State(Arc::clone(&service)),
            Json(ChatRequest {
                message: Some("hi".into()),
                session_id: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(reply.session_id, "default");
        assert_eq!(reply.response, "Hello");
        assert_eq!(reply.iterations, 1);
        assert_eq!(service.history("default").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn history_of_unknown_session_maps_to_404() {
        let service = scripted_service(vec![]);
        let response = history(State(Arc::new(service)), Path("ghost".to_string()))
            .await
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Session not found");
    }

    #[tokio::test]
    async fn clear_removes_the_session() {
        let service = Arc::new(scripted_service(vec![end_turn("Hello")]));
        service.chat("s1", "hi".into()).await.unwrap();

        let Json(body) = clear(State(Arc::clone(&service)), Path("s1".to_string()))
            .await
            .unwrap();
        assert_eq!(body["message"], "Session s1 cleared");

        assert!(matches!(
            service.history("s1").await,
            Err(ColloquyError::NotFound(_))
        ));
        assert!(matches!(
            service.clear("s1").await,
            Err(ColloquyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn error_taxonomy_maps_to_the_documented_statuses() {
        let cases = [
            (
                ColloquyError::IterationLimit(10).into_response(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Agent loop exceeded maximum iterations",
            ),
            (
                ColloquyError::Upstream("boom".into()).into_response(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get response from LLM",
            ),
            (
                ColloquyError::Config("bad".into()).into_response(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
            ),
        ];

        for (response, status, message) in cases {
            assert_eq!(response.status(), status);
            let body = body_json(response).await;
            assert_eq!(body["error"], message);
        }
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_as_llm_error() {
        let service = scripted_service(vec![]);
        let err = service.chat("s1", "hi".into()).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to get response from LLM");
    }
}
