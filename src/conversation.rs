//! Per-session conversation state
//!
//! Sessions are ephemeral and live in server memory only. Each holds an
//! optional city/state hint and a bounded history: once more than
//! [`MAX_HISTORY`] messages are stored the oldest are dropped first.

use crate::llm::{LlmMessage, MessageRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::RwLock;

pub const MAX_HISTORY: usize = 20;

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for LlmMessage {
    fn from(msg: &ChatMessage) -> Self {
        match msg.role {
            MessageRole::User => LlmMessage::user(msg.content.clone()),
            MessageRole::Assistant => LlmMessage::assistant(msg.content.clone()),
        }
    }
}

/// Session metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    fn new(id: String, city: Option<String>, state: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            city,
            state,
            created_at: now,
            last_active: now,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[allow(dead_code)] // Returned by out-of-process backends
    #[error("Conversation store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for sessions and their bounded histories
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Register a new session with a generated id
    async fn create_session(&self, city: Option<String>, state: Option<String>) -> Session;

    async fn get_session(&self, id: &str) -> Option<Session>;

    /// Update location hints; `None` keeps the stored value. Returns `None`
    /// for unknown sessions.
    async fn update_location(
        &self,
        id: &str,
        city: Option<String>,
        state: Option<String>,
    ) -> Option<Session>;

    /// Snapshot of the history, oldest first
    async fn history(&self, id: &str) -> Vec<ChatMessage>;

    /// Append a message, creating the session if needed and evicting the
    /// oldest entries beyond the window
    async fn append(&self, id: &str, message: ChatMessage) -> Result<(), StoreError>;

    /// Drop the session and its history. Unknown ids are ignored.
    async fn delete(&self, id: &str);

    /// Drop sessions idle for longer than `ttl`; returns how many went
    async fn evict_idle(&self, ttl: Duration) -> usize;
}

struct SessionEntry {
    session: Session,
    history: VecDeque<ChatMessage>,
}

/// Process-local store guarded by a single lock
pub struct InMemoryConversationStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    max_history: usize,
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::with_max_history(MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Drop sessions whose last activity is before `cutoff`
    pub async fn evict_inactive_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.session.last_active >= cutoff);
        before - sessions.len()
    }

    #[allow(dead_code)] // Used in tests
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_session(&self, city: Option<String>, state: Option<String>) -> Session {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), city, state);
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                session: session.clone(),
                history: VecDeque::new(),
            },
        );
        session
    }

    async fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).map(|e| e.session.clone())
    }

    async fn update_location(
        &self,
        id: &str,
        city: Option<String>,
        state: Option<String>,
    ) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        if city.is_some() {
            entry.session.city = city;
        }
        if state.is_some() {
            entry.session.state = state;
        }
        entry.session.last_active = Utc::now();
        Some(entry.session.clone())
    }

    async fn history(&self, id: &str) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|e| e.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn append(&self, id: &str, message: ChatMessage) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionEntry {
                session: Session::new(id.to_string(), None, None),
                history: VecDeque::new(),
            });
        entry.history.push_back(message);
        while entry.history.len() > self.max_history {
            entry.history.pop_front();
        }
        entry.session.last_active = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }

    async fn evict_idle(&self, ttl: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.evict_inactive_before(cutoff).await
    }
}
