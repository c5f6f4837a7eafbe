//! Client for the external SNAP search agent
//!
//! The agent takes `{query, state, type}` and answers
//! `{success, results: [{title, description, url, ...}]}`.

use super::{SearchError, SearchHit, SearchRequest, WebSearch, SEARCH_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const AGENT_PATH: &str = "agent_snap_search_001";

pub struct AgentSearchClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AgentSearchClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: format!("{}/{AGENT_PATH}", base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    results: Vec<SearchHit>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl WebSearch for AgentSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            let err = SearchError::from_reqwest(&e);
            if matches!(err, SearchError::Connect(_)) {
                tracing::error!(endpoint = %self.endpoint, "Could not connect to search agent, is it running?");
            }
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AgentResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        if !parsed.success {
            tracing::debug!(message = ?parsed.message, "Search agent returned no results");
            return Ok(vec![]);
        }
        Ok(parsed.results)
    }

    fn name(&self) -> &str {
        "search-agent"
    }
}
