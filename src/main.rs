//! SnapBot - SNAP benefits chat assistant
//!
//! Routes each chat message by intent to web-search grounded answers,
//! resource lookups or a plain conversational reply.

mod api;
mod chat;
mod config;
mod conversation;
mod db;
mod intent;
mod llm;
mod lookup;
mod retry;
mod search;
#[cfg(test)]
pub mod testing;

use api::{create_router, AppState};
use chat::ChatOrchestrator;
use config::AppConfig;
use conversation::{ConversationStore, InMemoryConversationStore};
use db::Database;
use llm::{AnthropicService, LlmService, LoggingService};
use search::{AgentSearchClient, GoogleSearchClient, WebSearch};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle sessions are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapbot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Resource database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    // LLM
    let api_key = config.llm.anthropic_api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("No LLM API key configured. Set ANTHROPIC_API_KEY.");
    }
    let anthropic = AnthropicService::new(api_key, config.llm.model(), config.llm.gateway.as_deref());
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(anthropic)));
    tracing::info!(model = %llm.model_id(), "LLM client initialized");

    // Web search
    let search: Arc<dyn WebSearch> = match config.search.google_credentials() {
        Some((key, cx)) => Arc::new(GoogleSearchClient::new(key, cx)),
        None => Arc::new(AgentSearchClient::new(
            &config.search.agent_url,
            config.search.agent_api_key.clone(),
        )),
    };
    tracing::info!(provider = search.name(), "Web search initialized");

    // Sessions
    let store = Arc::new(InMemoryConversationStore::new());
    if let Some(ttl) = config.session_ttl {
        spawn_session_sweeper(store.clone(), ttl);
    }

    let resources = Arc::new(db);
    let chat = ChatOrchestrator::new(llm, search, resources.clone(), store);
    let state = AppState::new(chat, resources);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(cors).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("SnapBot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodically drop sessions idle for longer than `ttl`
fn spawn_session_sweeper(store: Arc<InMemoryConversationStore>, ttl: Duration) {
    tracing::info!(ttl_secs = ttl.as_secs(), "Session expiry enabled");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = store.evict_idle(ttl).await;
            if evicted > 0 {
                tracing::info!(evicted, "Expired idle sessions");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutting down");
}
