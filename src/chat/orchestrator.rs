//! Top-level chat pipeline

use super::prompts::{
    application_prompt, assistant_prompt, benefit_status_prompt, no_results_message,
    PLAIN_MAX_TOKENS, SEARCH_MAX_TOKENS, SNAP_STORE_FOLLOWUP,
};
use super::{ChatError, ChatReply, Route};
use crate::conversation::{ChatMessage, ConversationStore};
use crate::db::LocationLookup;
use crate::intent::{Intent, IntentClassifier};
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use crate::lookup::{format_results, LocationQueryRouter, LookupKind, LookupOutcome};
use crate::retry::RetryPolicy;
use crate::search::{SearchResultAggregator, WebSearch};
use std::sync::Arc;
use std::time::Instant;

/// Per-call inputs
struct Turn<'a> {
    message: &'a str,
    session_id: &'a str,
    city: Option<&'a str>,
    state: Option<&'a str>,
}

pub struct ChatOrchestrator {
    llm: Arc<dyn LlmService>,
    classifier: IntentClassifier,
    search: SearchResultAggregator,
    router: LocationQueryRouter,
    store: Arc<dyn ConversationStore>,
}

impl ChatOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmService>,
        search: Arc<dyn WebSearch>,
        lookup: Arc<dyn LocationLookup>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(llm.clone()),
            search: SearchResultAggregator::new(search),
            router: LocationQueryRouter::new(lookup),
            llm,
            store,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_classifier_policy(mut self, policy: RetryPolicy) -> Self {
        self.classifier = self.classifier.with_policy(policy);
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Answer one message. Never fails: pipeline errors become an apology
    /// with the error text attached.
    pub async fn handle(
        &self,
        message: &str,
        session_id: &str,
        city: Option<&str>,
        state: Option<&str>,
    ) -> ChatReply {
        let turn = Turn {
            message,
            session_id,
            city,
            state,
        };
        let start = Instant::now();
        let mut user_recorded = false;

        match self.respond(&turn, &mut user_recorded).await {
            Ok(reply) => {
                tracing::info!(
                    session_id,
                    duration_ms = %start.elapsed().as_millis(),
                    requires_followup = reply.requires_followup,
                    "Chat message answered"
                );
                reply
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "Chat pipeline failed");
                if !user_recorded {
                    if let Err(store_err) = self.store.append(session_id, ChatMessage::user(message)).await {
                        tracing::warn!(session_id, error = %store_err, "Could not record user message");
                    }
                }
                ChatReply::failed(&e)
            }
        }
    }

    /// Drop the session's history. Unknown sessions are ignored.
    pub async fn clear(&self, session_id: &str) {
        self.store.delete(session_id).await;
        tracing::info!(session_id, "Conversation cleared");
    }

    async fn respond(&self, turn: &Turn<'_>, user_recorded: &mut bool) -> Result<ChatReply, ChatError> {
        let history = self.store.history(turn.session_id).await;
        let intent = self.classifier.classify(turn.message, &history).await;

        self.store
            .append(turn.session_id, ChatMessage::user(turn.message))
            .await?;
        *user_recorded = true;

        let route = Route::for_intent(intent);
        tracing::info!(
            session_id = turn.session_id,
            intent = %intent,
            route = route.as_str(),
            "Message classified"
        );

        let reply = match route {
            Route::ComposeWithSearch => self.compose_with_search(turn, intent).await?,
            Route::QueryDb => match self.query_db(turn, intent).await {
                Some(reply) => reply,
                None => self.compose_plain(turn).await?,
            },
            Route::ComposePlain => self.compose_plain(turn).await?,
        };

        self.store
            .append(turn.session_id, ChatMessage::assistant(reply.response.clone()))
            .await?;
        Ok(reply)
    }

    async fn compose_with_search(&self, turn: &Turn<'_>, intent: Intent) -> Result<ChatReply, ChatError> {
        let results = self.search.search(turn.message, turn.state, intent).await;
        let system = if intent == Intent::SnapBenefitStatus {
            benefit_status_prompt(turn.city, turn.state, &results)
        } else {
            application_prompt(turn.city, turn.state, &results)
        };

        let request = LlmRequest::new(vec![LlmMessage::user(turn.message)])
            .with_system(system)
            .with_max_tokens(SEARCH_MAX_TOKENS);
        let response = self.llm.complete(&request).await?;
        Ok(ChatReply::text(response.text()))
    }

    /// `None` means the store was unavailable and the caller should fall
    /// back to a plain conversational answer
    async fn query_db(&self, turn: &Turn<'_>, intent: Intent) -> Option<ChatReply> {
        match self.router.route(intent, turn.city, turn.state).await {
            LookupOutcome::Found { kind, records } => {
                let mut response = format_results(&records);
                let requires_followup = kind == LookupKind::SnapStores && intent == Intent::FindSnapStore;
                if requires_followup {
                    response.push_str(SNAP_STORE_FOLLOWUP);
                }
                Some(ChatReply {
                    response,
                    requires_followup,
                    db_results: Some(records),
                    error: None,
                })
            }
            LookupOutcome::Empty | LookupOutcome::NotApplicable => {
                Some(ChatReply::text(no_results_message(turn.city, turn.state)))
            }
            LookupOutcome::Unavailable(e) => {
                tracing::info!(
                    session_id = turn.session_id,
                    error = %e,
                    "Resource store unavailable, falling back to conversational response"
                );
                None
            }
        }
    }

    async fn compose_plain(&self, turn: &Turn<'_>) -> Result<ChatReply, ChatError> {
        let history = self.store.history(turn.session_id).await;
        let mut messages: Vec<LlmMessage> = history.iter().map(LlmMessage::from).collect();
        if messages.is_empty() {
            messages.push(LlmMessage::user(turn.message));
        }

        let request = LlmRequest::new(messages)
            .with_system(assistant_prompt(turn.city, turn.state))
            .with_max_tokens(PLAIN_MAX_TOKENS);
        let response = self.llm.complete(&request).await?;
        Ok(ChatReply::text(response.text()))
    }
}
