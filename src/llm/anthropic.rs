//! Anthropic Claude provider implementation

use super::types::*;
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic service implementation
pub struct AnthropicService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicService {
    pub fn new(api_key: String, model: impl Into<String>, gateway: Option<&str>) -> Self {
        let base_url = match gateway {
            Some(gw) => format!("{}/v1/messages", gw.trim_end_matches('/')),
            None => DEFAULT_BASE_URL.to_string(),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            model: model.into(),
            base_url,
        }
    }

    fn translate_request(&self, request: &LlmRequest) -> AnthropicRequest {
        let system: Vec<AnthropicSystemBlock> = request
            .system
            .iter()
            .map(|s| AnthropicSystemBlock {
                r#type: "text".to_string(),
                text: s.text.clone(),
                cache_control: if s.cache {
                    Some(CacheControl {
                        r#type: "ephemeral".to_string(),
                    })
                } else {
                    None
                },
            })
            .collect();

        let messages: Vec<AnthropicMessage> = request
            .messages
            .iter()
            .map(Self::translate_message)
            .collect();

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
        }
    }

    fn translate_message(msg: &LlmMessage) -> AnthropicMessage {
        let content = msg
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => AnthropicContentBlock::Text { text: text.clone() },
            })
            .collect();

        AnthropicMessage {
            role: msg.role.as_str().to_string(),
            content,
        }
    }

    fn normalize_response(resp: AnthropicResponse) -> LlmResponse {
        let content: Vec<ContentBlock> = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(ContentBlock::Text { text }),
                AnthropicContentBlock::Other => None,
            })
            .collect();

        let end_turn = resp.stop_reason.as_deref() == Some("end_turn");

        LlmResponse {
            content,
            end_turn,
            usage: Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
                cache_creation_tokens: resp.usage.cache_creation_input_tokens.unwrap_or(0),
                cache_read_tokens: resp.usage.cache_read_input_tokens.unwrap_or(0),
            },
        }
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        match status.as_u16() {
            401 | 403 => LlmError::auth(format!("Authentication failed, check the API key: {body}")),
            429 => {
                let mut err = LlmError::rate_limit(format!("Rate limited: {body}"));
                if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
                    if let Some(retry_after) = parsed
                        .get("error")
                        .and_then(|e| e.get("retry_after"))
                        .and_then(serde_json::Value::as_f64)
                    {
                        err = err.with_retry_after(Duration::from_secs_f64(retry_after));
                    }
                }
                err
            }
            400 => LlmError::invalid_request(format!("Invalid request: {body}")),
            500..=599 => LlmError::server_error(format!("Server error: {body}")),
            _ => LlmError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::auth("Missing API key: set ANTHROPIC_API_KEY"));
        }

        let anthropic_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("network error, connection failed (ECONNREFUSED?): {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("network error reading response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let anthropic_response: AnthropicResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(Self::normalize_response(anthropic_response))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<AnthropicSystemBlock>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicSystemBlock {
    r#type: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<CacheControl>,
}

#[derive(Debug, Serialize)]
struct CacheControl {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
    cache_creation_input_tokens: Option<u64>,
    cache_read_input_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;

    #[test]
    fn test_translate_request_shape() {
        let service = AnthropicService::new("key".into(), "claude-test", None);
        let request = LlmRequest::new(vec![
            LlmMessage::user("hello"),
            LlmMessage::assistant("hi!"),
        ])
        .with_system("be brief")
        .with_max_tokens(50);

        let json = serde_json::to_value(service.translate_request(&request)).unwrap();
        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["max_tokens"], 50);
        assert_eq!(json["system"][0]["text"], "be brief");
        assert!(json["system"][0].get("cache_control").is_none());
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
    }

    #[test]
    fn test_gateway_base_url() {
        let service = AnthropicService::new("key".into(), "m", Some("http://gw.local/"));
        assert_eq!(service.base_url, "http://gw.local/v1/messages");
    }

    #[test]
    fn test_classify_error() {
        let auth = AnthropicService::classify_error(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert_eq!(auth.kind, LlmErrorKind::Auth);
        assert!(auth.message.contains("API key"));

        let body = r#"{"error":{"retry_after":1.5}}"#;
        let limited = AnthropicService::classify_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(limited.kind, LlmErrorKind::RateLimit);
        assert_eq!(limited.retry_after, Some(Duration::from_millis(1500)));

        let server = AnthropicService::classify_error(reqwest::StatusCode::BAD_GATEWAY, "");
        assert!(server.kind.is_retryable());
    }

    #[test]
    fn test_normalize_response_skips_non_text_blocks() {
        let body = r#"{
            "content": [{"type":"text","text":"greeting"},{"type":"thinking","thinking":"x"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 2}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        let response = AnthropicService::normalize_response(parsed);
        assert_eq!(response.text(), "greeting");
        assert!(response.end_turn);
        assert_eq!(response.usage.output_tokens, 2);
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_error() {
        let service = AnthropicService::new(String::new(), "m", None);
        let err = service
            .complete(&LlmRequest::new(vec![LlmMessage::user("hi")]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert!(err.message.contains("API key"));
    }
}
