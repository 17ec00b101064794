//! Problem Coach server
//!
//! Hosts interview sessions over HTTP with SQLite persistence.

use problem_coach::api::{create_router, AppState};
use problem_coach::config::{EngineConfig, ServerConfig};
use problem_coach::db::Database;
use problem_coach::llm::{LlmConfig, ModelRegistry, Provider};
use problem_coach::oracle::LlmOracle;
use problem_coach::runtime::{Engine, SessionManager, ToolRegistryExecutor};
use problem_coach::tools::ToolRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the environment may already be set
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "problem_coach=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    // Configuration
    let server_config = ServerConfig::from_env();
    let engine_config = EngineConfig::from_env();
    let llm_config = LlmConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = server_config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %server_config.db_path.display(), "Opening database");
    let db = Database::open(&server_config.db_path)?;

    // Initialize LLM registry
    let llm_registry = Arc::new(ModelRegistry::new(&llm_config));
    let Some(service) = llm_registry.default_service() else {
        tracing::error!(
            openai = Provider::OpenAI.api_key_env_var(),
            gemini = Provider::Gemini.api_key_env_var(),
            "No LLM API keys configured. Set a provider key or LLM_GATEWAY."
        );
        return Err("no language model available".into());
    };
    tracing::info!(
        models = ?llm_registry.available_models(),
        default = %llm_registry.default_model_id(),
        "LLM registry initialized"
    );

    // Registry services already log every request
    let oracle = LlmOracle::new(
        service,
        llm_config.temperature,
        llm_config.strict_temperature,
    )
    .with_retry(engine_config.retry_policy());

    tracing::info!(
        pass_threshold = engine_config.gate.threshold(),
        merge_policy = ?engine_config.merge_policy,
        export_dir = %engine_config.export_dir.display(),
        "Engine configured"
    );
    let engine = Engine::new(
        oracle,
        ToolRegistryExecutor::new(ToolRegistry::standard()),
        &engine_config,
    );

    // Create application state
    let state = AppState::new(SessionManager::new(db, engine), llm_registry);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    tracing::info!("Problem Coach server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
