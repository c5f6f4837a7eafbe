//! Web search collaborator and result aggregation
//!
//! Searches run as an ordered [`SearchPlan`]; every step is bounded by
//! [`SEARCH_TIMEOUT`] and a failing step simply contributes nothing. The
//! collected hits are deduplicated by URL and official sources are moved to
//! the front.

mod agent;
mod aggregate;
mod google;
mod plan;

pub use agent::AgentSearchClient;
pub use aggregate::{aggregate, is_official_url};
pub use google::GoogleSearchClient;
pub use plan::SearchPlan;
#[allow(unused_imports)] // Used in tests
pub use plan::{SearchStep, RATE_LIMIT_PAUSE};

use crate::intent::Intent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

/// One query sent to the search collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(rename = "state")]
    pub location_hint: Option<String>,
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location_hint: None,
            type_hint: None,
        }
    }

    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.location_hint = location.map(String::from);
        self
    }

    pub fn with_type(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }
}

/// Raw hit as returned by a provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
}

impl SearchHit {
    #[allow(dead_code)] // Used in tests
    pub fn new(title: impl Into<String>, description: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: url.into(),
        }
    }
}

/// Aggregated result with its source classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub description: String,
    pub url: String,
    pub is_gov_source: bool,
}

impl From<SearchHit> for SearchResult {
    fn from(hit: SearchHit) -> Self {
        let is_gov_source = is_official_url(&hit.url);
        Self {
            title: hit.title,
            description: hit.description,
            url: hit.url,
            is_gov_source,
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search timeout")]
    Timeout,
    #[error("search connection failed: {0}")]
    Connect(String),
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode search response: {0}")]
    Decode(String),
}

impl SearchError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::Connect(e.to_string())
        } else if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else {
            SearchError::Request(e.to_string())
        }
    }
}

/// Web search provider
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Runs search plans against a provider and aggregates the hits
pub struct SearchResultAggregator {
    client: Arc<dyn WebSearch>,
    timeout: Duration,
}

impl SearchResultAggregator {
    pub fn new(client: Arc<dyn WebSearch>) -> Self {
        Self {
            client,
            timeout: SEARCH_TIMEOUT,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Search for an intent using today's date in the query templates
    pub async fn search(&self, query: &str, state: Option<&str>, intent: Intent) -> Vec<SearchResult> {
        let today = chrono::Local::now().date_naive();
        self.run(&SearchPlan::for_intent(intent, query, state, today)).await
    }

    /// Execute every step in order, pausing where the plan says so
    pub async fn run(&self, plan: &SearchPlan) -> Vec<SearchResult> {
        let mut hits = Vec::new();

        for (index, step) in plan.steps.iter().enumerate() {
            tracing::info!(
                provider = self.client.name(),
                step = index + 1,
                query = %step.request.query,
                "Web search"
            );

            match tokio::time::timeout(self.timeout, self.client.search(&step.request)).await {
                Ok(Ok(found)) => {
                    tracing::debug!(step = index + 1, count = found.len(), "Web search returned");
                    hits.extend(found);
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider = self.client.name(), error = %e, "Web search failed, continuing without results");
                }
                Err(_) => {
                    tracing::warn!(provider = self.client.name(), timeout_s = self.timeout.as_secs(), "Web search timed out");
                }
            }

            if let Some(pause) = step.pause_after {
                tokio::time::sleep(pause).await;
            }
        }

        let results = aggregate(hits);
        tracing::info!(
            results = results.len(),
            official = results.iter().filter(|r| r.is_gov_source).count(),
            "Web search aggregated"
        );
        results
    }
}
