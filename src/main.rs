use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dentdesk::config::AppConfig;
use dentdesk::handlers;
use dentdesk::services::ai::ollama::OllamaProvider;
use dentdesk::services::ai::openai::OpenAiProvider;
use dentdesk::services::ai::{CompletionOptions, LlmProvider};
use dentdesk::services::session::SessionStore;
use dentdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let options = CompletionOptions {
        temperature: config.llm_temperature,
        max_tokens: config.llm_max_tokens,
        timeout: Duration::from_secs(config.llm_timeout_secs),
    };

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                "llama3.2".to_string(),
                options,
            ))
        }
        _ => {
            anyhow::ensure!(
                !config.openai_api_key.is_empty(),
                "OPENAI_API_KEY must be set when LLM_PROVIDER=openai"
            );
            tracing::info!("using OpenAI LLM provider (model: {})", config.openai_model);
            Box::new(OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
                options,
            ))
        }
    };

    let sessions = SessionStore::new(config.session_ttl_minutes);

    let state = Arc::new(AppState {
        config,
        llm,
        sessions,
    });

    let app = Router::new()
        .route("/", get(handlers::chat::chat_page))
        .route("/chat", post(handlers::chat::post_chat))
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let addr = format!("0.0.0.0:{}", state.config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
