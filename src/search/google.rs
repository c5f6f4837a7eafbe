//! Google Custom Search JSON API provider

use super::{SearchError, SearchHit, SearchRequest, WebSearch, SEARCH_TIMEOUT};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

const GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
/// The API refuses more than 10 results per request
const MAX_PER_REQUEST: u8 = 10;
const DEFAULT_RESULTS: u8 = 5;

pub struct GoogleSearchClient {
    client: Client,
    api_key: String,
    engine_id: String,
    base_url: String,
    results_per_query: u8,
}

impl GoogleSearchClient {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            base_url: GOOGLE_SEARCH_URL.to_string(),
            results_per_query: DEFAULT_RESULTS,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, query: &str) -> Result<Url, SearchError> {
        let num = self.results_per_query.min(MAX_PER_REQUEST).to_string();
        Url::parse_with_params(
            &self.base_url,
            &[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ],
        )
        .map_err(|e| SearchError::Request(format!("invalid search URL: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    link: String,
}

#[async_trait]
impl WebSearch for GoogleSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        let url = self.request_url(&request.query)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GoogleResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(parsed
            .items
            .into_iter()
            .map(|item| SearchHit {
                title: item.title,
                description: item.snippet,
                url: item.link,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "google-cse"
    }
}
