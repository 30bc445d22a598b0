// src/server/handlers.rs
// HTTP handlers: chat, session administration, stats, health

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;

use super::AppState;
use crate::error::VegaError;
use crate::session::ChatMessage;

/// Default per-message truncation for history display
const DEFAULT_MEMORY_MAX_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    #[serde(default = "default_session")]
    pub session_id: String,
    pub max_chars: Option<usize>,
}

fn default_session() -> String {
    "default".to_string()
}

/// Caller-facing response shape
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: Value,
    #[serde(rename = "type")]
    pub kind: String,
    pub session_id: String,
}

/// Handle one chat turn.
///
/// The boundary translates every failure into a response: validation
/// failures become 400s, the unexpected class becomes a generic 500. The
/// interactive loop never sees a crash.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<Value>)> {
    let session_id = request.session_id;

    match state.agent.run(&request.message, &session_id).await {
        Ok(reply) => Ok(Json(ChatResponse {
            response: reply.to_value(),
            kind: reply.kind().to_string(),
            session_id,
        })),
        Err(VegaError::InvalidInput(msg)) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": msg,
                "type": "error",
                "session_id": session_id,
            })),
        )),
        Err(e) => {
            error!(error = %e, session_id = %session_id, "chat request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "The assistant failed to process your request. Please try again.",
                    "type": "error",
                    "session_id": session_id,
                })),
            ))
        }
    }
}

/// Clear one session's memory. Always succeeds.
pub async fn clear_memory(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Json<Value> {
    state.agent.clear_memory(&request.session_id).await;
    Json(json!({
        "status": "ok",
        "message": format!("Memory cleared for session: {}", request.session_id),
        "session_id": request.session_id,
    }))
}

#[derive(Debug, Serialize)]
struct MemoryEntry {
    role: String,
    content: String,
}

/// Fetch windowed history with per-message truncation
pub async fn get_memory(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Json<Value> {
    let max_chars = request.max_chars.unwrap_or(DEFAULT_MEMORY_MAX_CHARS);
    let messages = state.agent.get_memory(&request.session_id).await;

    let entries: Vec<MemoryEntry> = messages
        .iter()
        .map(|msg: &ChatMessage| {
            let mut content: String = msg.content.chars().take(max_chars).collect();
            if msg.content.chars().count() > max_chars {
                content.push_str("...");
            }
            MemoryEntry {
                role: msg.role.to_string(),
                content,
            }
        })
        .collect();

    Json(json!({
        "messages": entries,
        "count": entries.len(),
        "session_id": request.session_id,
    }))
}

/// Store-wide statistics
pub async fn get_stats(State(state): State<AppState>) -> Json<Value> {
    let stats = state.agent.get_stats().await;
    Json(json!({
        "active_sessions": stats.active_sessions,
        "total_messages": stats.total_messages,
        "session_ids": stats.session_ids,
    }))
}

/// Health check and status endpoint
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.model,
    }))
}
