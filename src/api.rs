//! HTTP API for the chat assistant
//!
//! A thin JSON surface over [`ChatOrchestrator`], the session store and
//! the resource store.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::chat::ChatOrchestrator;
use crate::conversation::ConversationStore;
use crate::db::LocationLookup;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatOrchestrator>,
    pub sessions: Arc<dyn ConversationStore>,
    pub resources: Arc<dyn LocationLookup>,
}

impl AppState {
    pub fn new(chat: ChatOrchestrator, resources: Arc<dyn LocationLookup>) -> Self {
        let sessions = chat.store().clone();
        Self {
            chat: Arc::new(chat),
            sessions,
            resources,
        }
    }
}
