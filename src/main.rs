use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizbowl::{
    api, auth,
    config::ServerConfig,
    llm,
    pool::{self, JsonFileStore, QuestionPool, QuestionStore},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizbowl=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Quizbowl...");

    let server_config = ServerConfig::from_env();
    let auth_config = Arc::new(auth::AuthConfig::from_env());

    let llm_config = llm::LlmConfig::from_env();
    let analyzer = match llm_config.build_provider() {
        Ok(provider) => {
            tracing::info!("Dispute analyzer: {}", provider.name());
            Some(provider)
        }
        Err(e) => {
            tracing::warn!("{}. AI dispute analysis will not be available.", e);
            None
        }
    };

    let builtins = pool::builtin_questions()?;
    let store: Arc<dyn QuestionStore> =
        Arc::new(JsonFileStore::new(&server_config.question_store_dir));
    // A damaged store must not be replaced by a fresh seed on the next save
    let question_pool = QuestionPool::load(store.as_ref(), builtins)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to load stored questions from {}: {}. Fix or remove the file and restart.",
                server_config.question_store_dir.display(),
                e
            );
            e
        })?;

    let state = Arc::new(AppState::new_with_llm(
        question_pool,
        store,
        analyzer,
        llm_config,
    ));

    let app = api::router(state, auth_config)
        .fallback_service(ServeDir::new(&server_config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
