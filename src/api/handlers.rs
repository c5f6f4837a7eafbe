//! HTTP request handlers

use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, MessageResponse, ResourceListResponse,
    ResourceQuery, SessionCreatedResponse, SessionRequest, SessionUpdatedResponse, StatusResponse,
};
use super::AppState;
use crate::conversation::Session;
use crate::db::ResourceStats;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Sessions
        .route("/api/session", post(create_session))
        .route(
            "/api/session/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        // Chat
        .route("/api/chat", post(chat))
        // Resource panel
        .route("/api/resources", get(search_resources))
        .route("/api/resources/stats", get(resource_stats))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

/// Treat blank strings from the UI as absent
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "SnapBot server is running",
    })
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Json<SessionCreatedResponse> {
    let session = state
        .sessions
        .create_session(present(req.city), present(req.state))
        .await;
    tracing::info!(session_id = %session.id, city = ?session.city, state = ?session.state, "Session created");

    Json(SessionCreatedResponse {
        session_id: session.id,
        message: "Session created successfully",
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    state
        .sessions
        .get_session(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionUpdatedResponse>, AppError> {
    let session = state
        .sessions
        .update_location(&id, present(req.city), present(req.state))
        .await
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(SessionUpdatedResponse {
        session_id: id,
        message: "Session updated successfully",
        session,
    }))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Json<MessageResponse> {
    state.chat.clear(&id).await;
    Json(MessageResponse {
        message: "Conversation cleared successfully",
    })
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    let session_id = present(req.session_id)
        .unwrap_or_else(|| format!("temp_{}", Utc::now().timestamp_millis()));

    // Stored session location wins; the request fills gaps
    let (city, region) = match state.sessions.get_session(&session_id).await {
        Some(session) => (
            session.city.or_else(|| present(req.city)),
            session.state.or_else(|| present(req.state)),
        ),
        None => (present(req.city), present(req.state)),
    };

    tracing::info!(session_id = %session_id, city = ?city, state = ?region, "Processing chat message");
    let reply = state
        .chat
        .handle(&req.message, &session_id, city.as_deref(), region.as_deref())
        .await;

    Ok(Json(ChatResponse {
        response: reply.response,
        session_id,
        requires_followup: reply.requires_followup,
        db_results: reply.db_results,
        error: reply.error,
        timestamp: Utc::now(),
    }))
}

// ============================================================
// Resources
// ============================================================

async fn search_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<Json<ResourceListResponse>, AppError> {
    let resources = &state.resources;
    let results = match (present(query.q), present(query.city), present(query.state)) {
        (Some(keyword), _, _) => resources.search_by_keyword(&keyword).await,
        (None, Some(city), Some(region)) => resources.search_by_location(&city, &region).await,
        (None, Some(location), None) | (None, None, Some(location)) => {
            resources.all_by_location(&location).await
        }
        (None, None, None) => {
            return Err(AppError::BadRequest(
                "Provide q, city or state".to_string(),
            ))
        }
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ResourceListResponse {
        count: results.len(),
        results,
    }))
}

async fn resource_stats(State(state): State<AppState>) -> Result<Json<ResourceStats>, AppError> {
    state
        .resources
        .stats()
        .await
        .map(Json)
        .map_err(|e| AppError::Internal(e.to_string()))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("snapbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatOrchestrator;
    use crate::conversation::{ConversationStore, InMemoryConversationStore};
    use crate::db::LocationLookup;
    use crate::retry::RetryPolicy;
    use crate::testing::{seeded_database, FailingLookup, MockLlmClient, ScriptedSearch};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        llm: Arc<MockLlmClient>,
        store: Arc<InMemoryConversationStore>,
    }

    fn app_with(resources: Arc<dyn LocationLookup>) -> TestApp {
        let llm = Arc::new(MockLlmClient::new("mock"));
        let store = Arc::new(InMemoryConversationStore::new());
        let chat = ChatOrchestrator::new(
            llm.clone(),
            Arc::new(ScriptedSearch::new()),
            Arc::new(seeded_database()),
            store.clone(),
        )
        .with_classifier_policy(RetryPolicy::new(1, Duration::ZERO));
        TestApp {
            router: create_router(AppState::new(chat, resources)),
            llm,
            store,
        }
    }

    fn app() -> TestApp {
        app_with(Arc::new(seeded_database()))
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    #[tokio::test]
    async fn test_health_and_version() {
        let app = app();
        let (status, body) = send(&app.router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app.router, Method::GET, "/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_str().unwrap().starts_with("snapbot "));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let app = app();
        let (status, body) = send(&app.router, Method::POST, "/api/session", Some(json!({"city": "Erie", "state": ""}))).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["sessionId"].as_str().unwrap().to_string();

        let (status, body) = send(&app.router, Method::GET, &format!("/api/session/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "Erie");
        assert!(body["state"].is_null());

        let (status, body) = send(&app.router, Method::PUT, &format!("/api/session/{id}"), Some(json!({"state": "PA"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["city"], "Erie");
        assert_eq!(body["session"]["state"], "PA");

        let (status, _) = send(&app.router, Method::DELETE, &format!("/api/session/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app.router, Method::GET, &format!("/api/session/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
    }

    #[tokio::test]
    async fn test_unknown_session_update_is_404() {
        let app = app();
        let (status, _) = send(&app.router, Method::PUT, "/api/session/nope", Some(json!({"city": "Erie"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app.router, Method::DELETE, "/api/session/nope", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let app = app();
        let (status, body) = send(&app.router, Method::POST, "/api/chat", Some(json!({"message": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");
        assert!(app.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_chat_uses_stored_session_location() {
        let app = app();
        let session = app.store.create_session(Some("Pittsburgh".into()), None).await;
        app.llm.queue_text("find_food_bank");

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/chat",
            Some(json!({"message": "food bank?", "sessionId": session.id, "city": "Columbus"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sessionId"], session.id.as_str());
        assert_eq!(body["requiresFollowup"], false);
        assert_eq!(body["dbResults"][0]["name"], "Greater Pittsburgh Community Food Bank");
        assert!(body.get("error").is_none());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_chat_without_session_gets_temporary_id() {
        let app = app();
        app.llm.queue_text("greeting");
        app.llm.queue_text("Hello!");

        let (status, body) = send(&app.router, Method::POST, "/api/chat", Some(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hello!");
        assert!(body["sessionId"].as_str().unwrap().starts_with("temp_"));
        assert!(body["dbResults"].is_null());
    }

    #[tokio::test]
    async fn test_chat_failure_is_still_200_with_error_field() {
        let app = app();
        app.llm.queue_text("other");
        app.llm.queue_error(crate::llm::LlmError::network("network error: connection refused"));

        let (status, body) = send(&app.router, Method::POST, "/api/chat", Some(json!({"message": "tell me a joke"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_str().unwrap().contains("trouble connecting"));
        assert_eq!(body["error"], "network error: connection refused");
    }

    #[tokio::test]
    async fn test_resource_search_and_stats() {
        let app = app();
        let (status, body) = send(&app.router, Method::GET, "/api/resources?q=kosher", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["name"], "Ahavas Kosher Deli");

        let (status, _) = send(&app.router, Method::GET, "/api/resources?q=", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app.router, Method::GET, "/api/resources?city=Columbus&state=PA", None).await;
        assert_eq!(body["count"], 5);
        let (_, body) = send(&app.router, Method::GET, "/api/resources?state=OH", None).await;
        assert_eq!(body["count"], 1);

        let (status, body) = send(&app.router, Method::GET, "/api/resources/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalRecords"], 5);
        assert_eq!(body["recordsWithLinks"], 1);
    }

    #[tokio::test]
    async fn test_resource_store_failure_is_500() {
        let app = app_with(Arc::new(FailingLookup));
        let (status, body) = send(&app.router, Method::GET, "/api/resources/stats", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("store offline"));
    }
}
