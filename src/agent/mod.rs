// src/agent/mod.rs
// Orchestration facade: classify, route, invoke, remember

mod pipeline;
pub mod prompts;

use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

pub use pipeline::FALLBACK_APOLOGY;
use pipeline::PipelineOutcome;

use crate::error::{Result, VegaError};
use crate::intent::{Intent, classify};
use crate::llm::CompletionBackend;
use crate::llm::schema::{CodeExplanation, CodeImprovement};
use crate::session::{ChatMessage, ChatRole, MemoryStats, SessionStore};

/// Fixed advisory returned when the completion service stays rate-limited
/// through the whole retry schedule. A user-facing message, not an error:
/// callers working through the facade degrade gracefully.
pub const RATE_LIMIT_ADVISORY: &str = "\
Rate limit reached. The completion service is temporarily rate-limited; \
please wait 30-60 seconds and try again. Keeping messages concise and \
spacing them out helps avoid this.";

/// The result of one agent turn. Tagged so callers dispatch on the
/// discriminant instead of inspecting shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentReply {
    Explanation(CodeExplanation),
    Improvement(CodeImprovement),
    Text(String),
}

impl AgentReply {
    /// Discriminant used in the caller-facing `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            AgentReply::Explanation(_) => "code_explanation",
            AgentReply::Improvement(_) => "code_improvement",
            AgentReply::Text(_) => "text",
        }
    }

    /// JSON value of the payload alone
    pub fn to_value(&self) -> Value {
        match self {
            AgentReply::Explanation(e) => json!(e),
            AgentReply::Improvement(i) => json!(i),
            AgentReply::Text(t) => json!(t),
        }
    }

    /// Rendering appended to session history as the assistant turn.
    /// Structured replies are stored as their JSON serialization so later
    /// turns can reference the discussed code.
    fn history_text(&self) -> String {
        match self {
            AgentReply::Text(t) => t.clone(),
            other => other.to_value().to_string(),
        }
    }
}

/// The conversational agent: the single entry point gluing session memory,
/// intent classification, and the pipelines together. The store is injected
/// so tests can substitute an isolated one; the backend is injected so tests
/// can script the completion service.
pub struct Agent {
    backend: Arc<dyn CompletionBackend>,
    store: Arc<SessionStore>,
}

impl Agent {
    pub fn new(backend: Arc<dyn CompletionBackend>, store: Arc<SessionStore>) -> Self {
        Self { backend, store }
    }

    /// Process one user turn.
    ///
    /// History policy: every successful turn (including a successful
    /// degraded free-text fallback) appends exactly two messages: the
    /// user's input and the reply. The apology and rate-limit advisory
    /// paths do not touch history, so a failed structured attempt never
    /// pollutes later context.
    pub async fn run(&self, input: &str, session_id: &str) -> Result<AgentReply> {
        if input.trim().is_empty() {
            return Err(VegaError::InvalidInput("empty input provided".to_string()));
        }

        info!(session_id = %session_id, "processing request");

        // Windowed read: bounds every outbound request and is where the
        // stored log gets trimmed.
        let history = self.store.windowed(session_id).await;

        let intent = classify(self.backend.as_ref(), &history, input).await;

        let outcome = match intent {
            Intent::CodeExplanation => {
                pipeline::run_explanation(self.backend.as_ref(), &history, input).await
            }
            Intent::CodeImprovement => {
                pipeline::run_improvement(self.backend.as_ref(), &history, input).await
            }
            Intent::GeneralQuestion => {
                pipeline::run_general(self.backend.as_ref(), &history, input).await
            }
        };

        match outcome {
            Ok(PipelineOutcome::Reply(reply)) => {
                self.store.append(session_id, ChatRole::Human, input).await;
                self.store
                    .append(session_id, ChatRole::Ai, reply.history_text())
                    .await;
                info!(session_id = %session_id, kind = reply.kind(), "request processed");
                Ok(reply)
            }
            Ok(PipelineOutcome::Apology(text)) => Ok(AgentReply::Text(text)),
            Err(VegaError::RateLimited) => {
                error!(session_id = %session_id, "rate limit persisted after retries");
                Ok(AgentReply::Text(RATE_LIMIT_ADVISORY.to_string()))
            }
            Err(e @ VegaError::Execution(_)) => Err(e),
            Err(e) => {
                error!(session_id = %session_id, error = %e, "unexpected pipeline failure");
                Err(VegaError::execution(e))
            }
        }
    }

    /// Empty one session's memory. No-op for unknown sessions.
    pub async fn clear_memory(&self, session_id: &str) {
        self.store.clear(session_id).await;
    }

    /// Empty every session
    pub async fn clear_all_sessions(&self) {
        self.store.clear_all().await;
    }

    /// Windowed history snapshot for a session
    pub async fn get_memory(&self, session_id: &str) -> Vec<ChatMessage> {
        self.store.windowed(session_id).await
    }

    /// Windowed history rendered for display with per-message truncation
    pub async fn get_formatted_memory(&self, session_id: &str, max_chars: usize) -> String {
        self.store.formatted_history(session_id, max_chars).await
    }

    /// Current store statistics
    pub async fn get_stats(&self) -> MemoryStats {
        self.store.stats().await
    }
}
