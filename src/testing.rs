//! Test doubles for the external collaborators

use crate::db::{Database, DbError, DbResult, LocationLookup, LocationRecord, ResourceStats};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::search::{SearchError, SearchHit, SearchRequest, WebSearch};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// LLM client returning queued results in order and recording every request
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    pub requests: Mutex<Vec<LlmRequest>>,
}

#[allow(dead_code)]
impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_text(&self, text: impl Into<String>) {
        self.queue_response(LlmResponse::from_text(text));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("network error: no mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Scripted web search
// ============================================================================

/// Search provider replaying scripted outcomes; empty once the script runs out
#[derive(Default)]
pub struct ScriptedSearch {
    outcomes: Mutex<VecDeque<Result<Vec<SearchHit>, SearchError>>>,
    requests: Mutex<Vec<SearchRequest>>,
    delay: Duration,
}

#[allow(dead_code)]
impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_ok(&self, hits: Vec<SearchHit>) {
        self.outcomes.lock().unwrap().push_back(Ok(hits));
    }

    pub fn push_err(&self, error: SearchError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for ScriptedSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcomes.lock().unwrap().pop_front().unwrap_or_else(|| Ok(vec![]))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Resource store doubles
// ============================================================================

/// Store whose every query fails
pub struct FailingLookup;

fn unavailable<T>() -> DbResult<T> {
    Err(DbError::Task("store offline".into()))
}

#[async_trait]
impl LocationLookup for FailingLookup {
    async fn search_by_type(&self, _: &str, _: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        unavailable()
    }
    async fn search_snap_accepting(&self, _: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        unavailable()
    }
    async fn search_by_dietary(&self, _: &str, _: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        unavailable()
    }
    async fn all_by_location(&self, _: &str) -> DbResult<Vec<LocationRecord>> {
        unavailable()
    }
    async fn search_by_location(&self, _: &str, _: &str) -> DbResult<Vec<LocationRecord>> {
        unavailable()
    }
    async fn search_by_keyword(&self, _: &str) -> DbResult<Vec<LocationRecord>> {
        unavailable()
    }
    async fn stats(&self) -> DbResult<ResourceStats> {
        unavailable()
    }
}

/// In-memory store with a handful of Pennsylvania and Ohio resources
pub fn seeded_database() -> Database {
    let db = Database::open_in_memory().unwrap();
    let records = [
        LocationRecord::new(
            "Greater Pittsburgh Community Food Bank",
            "1 N Linden St, Duquesne, Pittsburgh, PA",
            "Regional food bank and pantry network",
            Some("https://pittsburghfoodbank.org"),
        ),
        LocationRecord::new(
            "Crescent Halal Market",
            "Oakland, Pittsburgh, PA",
            "Halal grocer, accepts SNAP and EBT",
            None,
        ),
        LocationRecord::new(
            "Ahavas Kosher Deli",
            "Squirrel Hill, Pittsburgh, PA",
            "Kosher deli and bakery",
            None,
        ),
        LocationRecord::new(
            "Philly Soup Kitchen",
            "Philadelphia, PA",
            "Hot meals daily, community kitchen",
            None,
        ),
        LocationRecord::new("Corner Grocery", "Columbus, OH", "Accepts food stamps", None),
    ];
    for record in &records {
        db.insert_record(record).unwrap();
    }
    db
}
