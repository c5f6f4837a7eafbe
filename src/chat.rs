//! Chat pipeline
//!
//! A message moves through `received -> classified -> {search, lookup,
//! plain} -> responded`. Only a failed composition call escapes a branch;
//! it is turned into an apology at the orchestrator boundary.

mod orchestrator;
mod prompts;

pub use orchestrator::ChatOrchestrator;

use crate::conversation::StoreError;
use crate::db::LocationRecord;
use crate::intent::Intent;
use crate::llm::LlmError;
use serde::Serialize;
use thiserror::Error;

/// Which branch answers a classified message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Web search results folded into an LLM composition
    ComposeWithSearch,
    /// Resource store lookup rendered as a list
    QueryDb,
    /// Generic conversational LLM call
    ComposePlain,
}

impl Route {
    pub fn for_intent(intent: Intent) -> Self {
        if intent.is_search_augmented() {
            Route::ComposeWithSearch
        } else if intent.is_lookup() {
            Route::QueryDb
        } else {
            Route::ComposePlain
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Route::ComposeWithSearch => "composing_with_search",
            Route::QueryDb => "querying_db",
            Route::ComposePlain => "composing_plain",
        }
    }
}

/// Result of handling one chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub requires_followup: bool,
    pub db_results: Option<Vec<LocationRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            requires_followup: false,
            db_results: None,
            error: None,
        }
    }

    fn failed(error: &ChatError) -> Self {
        let message = error.to_string();
        Self {
            response: apology(&message),
            requires_followup: false,
            db_results: None,
            error: Some(message),
        }
    }
}

/// Failures that abort the pipeline
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Compose(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

const APOLOGY: &str = "I apologize, but I'm having trouble processing your request right now. ";

/// User-facing apology chosen by the kind of failure named in `error`
pub fn apology(error: &str) -> String {
    let hint = if error.contains("API key") {
        "There seems to be an issue with the API configuration. Please contact support."
    } else if error.contains("network") || error.contains("ECONNREFUSED") {
        "I'm having trouble connecting to my services. Please check that all servers are running and try again."
    } else if error.contains("timeout") {
        "The request took too long. Please try again with a simpler question."
    } else {
        "Please try again, and if the problem persists, try rephrasing your question."
    };
    format!("{APOLOGY}{hint}")
}
