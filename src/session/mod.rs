// src/session/mod.rs
// Per-session conversation memory: an append-only message log per session
// id, windowed to the most recent N messages at read time.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Human,
    Ai,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::Human => write!(f, "human"),
            ChatRole::Ai => write!(f, "ai"),
        }
    }
}

/// A single conversation message. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub created_at: i64,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now().timestamp(),
        }
    }
}

/// Usage statistics across all sessions, computed on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub active_sessions: usize,
    pub total_messages: usize,
    pub session_ids: Vec<String>,
}

#[derive(Default)]
struct SessionState {
    messages: Vec<ChatMessage>,
}

/// In-memory session store. Sessions are created lazily on first reference
/// and live until cleared; nothing expires on its own.
///
/// Locking is two-level: an outer RwLock over the session map, and one Mutex
/// per session so concurrent requests on different sessions never block each
/// other while appends within one session stay strictly ordered.
pub struct SessionStore {
    window_size: usize,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Get or create the state for a session. Never fails.
    async fn session(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        if let Some(state) = self.sessions.read().await.get(session_id) {
            return Arc::clone(state);
        }
        let mut map = self.sessions.write().await;
        Arc::clone(map.entry(session_id.to_string()).or_default())
    }

    /// Append a message to the end of a session's log. O(1): windowing is
    /// deferred to the next windowed read.
    pub async fn append(&self, session_id: &str, role: ChatRole, content: impl Into<String>) {
        let state = self.session(session_id).await;
        state.lock().await.messages.push(ChatMessage::new(role, content));
    }

    /// Windowed read: trims the stored log to the most recent `window_size`
    /// messages, then returns a snapshot. The trim happens here, right where
    /// history is about to be sent upstream, so every outbound request is
    /// bounded deterministically. A session may transiently exceed the
    /// window between writes and the next windowed read.
    pub async fn windowed(&self, session_id: &str) -> Vec<ChatMessage> {
        let state = self.session(session_id).await;
        let mut guard = state.lock().await;
        let len = guard.messages.len();
        if len > self.window_size {
            guard.messages.drain(..len - self.window_size);
            debug!(
                session_id = %session_id,
                window = self.window_size,
                "truncated session history to window"
            );
        }
        guard.messages.clone()
    }

    /// Raw snapshot of a session's log, without applying the window.
    /// Returns an empty list for unknown sessions.
    pub async fn messages(&self, session_id: &str) -> Vec<ChatMessage> {
        match self.sessions.read().await.get(session_id) {
            Some(state) => state.lock().await.messages.clone(),
            None => Vec::new(),
        }
    }

    /// Empty one session's log. Logged no-op if the session does not exist.
    pub async fn clear(&self, session_id: &str) {
        match self.sessions.read().await.get(session_id) {
            Some(state) => {
                state.lock().await.messages.clear();
                debug!(session_id = %session_id, "cleared session memory");
            }
            None => {
                warn!(session_id = %session_id, "clear requested for unknown session");
            }
        }
    }

    /// Empty the entire store
    pub async fn clear_all(&self) {
        self.sessions.write().await.clear();
        debug!("cleared all session memory");
    }

    /// Current store statistics
    pub async fn stats(&self) -> MemoryStats {
        let map = self.sessions.read().await;
        let mut total_messages = 0;
        let mut session_ids = Vec::with_capacity(map.len());
        for (id, state) in map.iter() {
            total_messages += state.lock().await.messages.len();
            session_ids.push(id.clone());
        }
        MemoryStats {
            active_sessions: map.len(),
            total_messages,
            session_ids,
        }
    }

    /// Windowed history rendered for display, each message truncated to
    /// `max_chars` characters.
    pub async fn formatted_history(&self, session_id: &str, max_chars: usize) -> String {
        let messages = self.windowed(session_id).await;
        if messages.is_empty() {
            return "No conversation history in this session.".to_string();
        }

        let mut lines = vec![format!("Conversation history ({} messages):", messages.len())];
        for (i, msg) in messages.iter().enumerate() {
            let label = match msg.role {
                ChatRole::Human => "User",
                ChatRole::Ai => "Assistant",
            };
            let mut content: String = msg.content.chars().take(max_chars).collect();
            if msg.content.chars().count() > max_chars {
                content.push_str("...");
            }
            lines.push(format!("{}. {}: {}", i + 1, label, content));
        }
        lines.join("\n")
    }
}
