//! Environment-driven configuration
//!
//! Everything is read once at startup; every field has a usable default so
//! the server can come up without any environment at all.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DB_PATH: &str = "Database/my_records.db";
const DEFAULT_AGENT_URL: &str = "http://localhost:3500";
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// LLM collaborator settings
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    /// Base URL override for the Messages API
    pub gateway: Option<String>,
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Web-search collaborator settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub agent_url: String,
    pub agent_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            agent_url: DEFAULT_AGENT_URL.to_string(),
            agent_api_key: None,
            google_api_key: None,
            google_search_engine_id: None,
        }
    }
}

impl SearchConfig {
    /// Google credentials, only when both halves are present
    pub fn google_credentials(&self) -> Option<(&str, &str)> {
        match (&self.google_api_key, &self.google_search_engine_id) {
            (Some(key), Some(cx)) if !key.is_empty() && !cx.is_empty() => {
                Some((key.as_str(), cx.as_str()))
            }
            _ => None,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// Idle expiry for sessions; `None` keeps them forever
    pub session_ttl: Option<Duration>,
    pub llm: LlmConfig,
    pub search: SearchConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map)
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(k).filter(|v| !v.is_empty()));

        let port = first(&["SNAPBOT_PORT", "PORT"])
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let db_path = first(&["SNAPBOT_DB_PATH", "DB_PATH"])
            .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);

        let ttl_secs = get("SNAPBOT_SESSION_TTL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);
        let session_ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));

        Self {
            port,
            db_path,
            session_ttl,
            llm: LlmConfig {
                anthropic_api_key: get("ANTHROPIC_API_KEY"),
                gateway: get("LLM_GATEWAY"),
                model: first(&["CLAUDE_MODEL"]),
            },
            search: SearchConfig {
                agent_url: first(&["AGENTUITY_URL"]).unwrap_or_else(|| DEFAULT_AGENT_URL.to_string()),
                agent_api_key: first(&["AGENTUITY_API_KEY"]),
                google_api_key: get("GOOGLE_API_KEY"),
                google_search_engine_id: get("GOOGLE_SEARCH_ENGINE_ID"),
            },
        }
    }
}
