//! LLM-backed intent classifier with keyword fallback

use super::{classify_by_keywords, Intent};
use crate::conversation::ChatMessage;
use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, SystemContent};
use crate::retry::RetryPolicy;
use std::sync::Arc;

const CLASSIFY_MAX_TOKENS: u32 = 50;

const CLASSIFIER_PROMPT: &str = r"You are an intent classifier for a SNAP benefits assistant chatbot. Analyze the user's message and classify it into ONE of these categories:

CATEGORIES:
- greeting: casual greetings or chitchat (hello, hi, how are you, thanks, etc.)
- snap_application: asking how to apply for SNAP benefits
- snap_benefit_status: checking SNAP benefit status, disbursement, cancellations, or government shutdown impacts
- find_food_bank: looking for food banks or food pantries
- find_soup_kitchen: looking for soup kitchens or hot meals
- find_snap_store: looking for stores that accept SNAP/EBT benefits
- find_halal: looking for halal food options or stores
- find_kosher: looking for kosher food options or stores
- general_resources: general request for help or resources in the area
- general_question: general questions about SNAP, eligibility, or benefits
- other: anything that doesn't fit the above categories

Respond with ONLY the category name, nothing else.";

/// Classifies messages with the LLM, retrying per `policy` and falling back
/// to `fallback` once the attempts run out. Never fails.
pub struct IntentClassifier {
    llm: Arc<dyn LlmService>,
    policy: RetryPolicy,
    fallback: fn(&str) -> Intent,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            policy: RetryPolicy::default(),
            fallback: classify_by_keywords,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn build_request(message: &str, history: &[ChatMessage]) -> LlmRequest {
        let mut messages: Vec<LlmMessage> = history.iter().map(LlmMessage::from).collect();
        messages.push(LlmMessage::user(message));

        let mut request = LlmRequest::new(messages).with_max_tokens(CLASSIFY_MAX_TOKENS);
        request.system.push(SystemContent::cached(CLASSIFIER_PROMPT));
        request
    }

    pub async fn classify(&self, message: &str, history: &[ChatMessage]) -> Intent {
        let request = &Self::build_request(message, history);
        let llm = &self.llm;
        let fallback = self.fallback;

        self.policy
            .run_or_else(
                "classify_intent",
                move |_| async move {
                    let reply = llm.complete(request).await?.text();
                    let intent = Intent::from_reply(&reply);
                    if intent == Intent::Other && !reply.trim().eq_ignore_ascii_case("other") {
                        tracing::warn!(reply = %reply.trim(), "Classifier reply outside intent set, using other");
                    }
                    Ok::<_, LlmError>(intent)
                },
                |_| {
                    let intent = fallback(message);
                    tracing::info!(intent = %intent, "Falling back to keyword classification");
                    intent
                },
            )
            .await
    }
}
