mod config;
mod db;
mod errors;
mod evaluation;
mod jobs;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::OpenAiClient;
use crate::routes::build_router;
use crate::screening::store::PgScreeningStore;
use crate::state::AppState;
use crate::storage::extract::PdfTextExtractor;
use crate::storage::LocalResumeStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Portal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs embedded migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client. A missing key is reported per request, not here.
    let llm = OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        config.llm_timeout,
    )?;
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; AI endpoints will return configuration errors");
    }
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        config.openai_model, config.llm_timeout
    );

    // Initialize resume storage
    let storage = LocalResumeStorage::open(&config.upload_dir).await?;

    // Build app state
    let state = AppState {
        db: db.clone(),
        llm: Arc::new(llm),
        store: Arc::new(PgScreeningStore::new(db)),
        storage: Arc::new(storage),
        extractor: Arc::new(PdfTextExtractor),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict CORS origins once the frontend host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
