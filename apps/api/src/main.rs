mod cases;
mod config;
mod db;
mod errors;
mod feedback;
mod matching;
mod models;
mod retrieval;
mod routes;
mod search;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cases::CaseMemory;
use crate::config::{Config, FeedbackBackend};
use crate::db::create_pool;
use crate::feedback::json_store::JsonFeedbackStore;
use crate::feedback::pg_store::PgFeedbackStore;
use crate::feedback::{FeedbackStore, FeedbackWeightStore};
use crate::matching::ranking::{RankingEngine, RankingWeights};
use crate::matching::skills::Vocabulary;
use crate::retrieval::adzuna::AdzunaProvider;
use crate::retrieval::http::build_client;
use crate::retrieval::jsearch::JSearchProvider;
use crate::retrieval::web_search::WebSearchProvider;
use crate::retrieval::{JobProvider, MultiSourceRetriever};
use crate::routes::build_router;
use crate::search::engine::JobMatchEngine;
use crate::state::AppState;

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

    info!("Starting JobMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Feedback weights: JSON document or PostgreSQL table
    let store: Arc<dyn FeedbackStore> = match &config.feedback_backend {
        FeedbackBackend::Json { path } => {
            let store = JsonFeedbackStore::new(path.clone());
            info!("Feedback store: JSON file {}", store.path().display());
            Arc::new(store)
        }
        FeedbackBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            let store = PgFeedbackStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
    };
    let feedback = FeedbackWeightStore::new(store);

    // Optional skill vocabulary
    let vocabulary = match &config.skill_vocabulary_path {
        Some(path) => {
            let vocabulary = Vocabulary::load(path).await?;
            if vocabulary.is_empty() {
                warn!("Skill vocabulary {} has no usable terms", path.display());
            }
            Some(Arc::new(vocabulary))
        }
        None => None,
    };

    // Historical cases for similarity lookup
    let cases = match &config.cases_path {
        Some(path) => CaseMemory::load(path).await?,
        None => CaseMemory::default(),
    };
    if cases.is_empty() {
        warn!("Case memory is empty (set CASES_PATH); similar-case lookups return nothing");
    }

    // Providers share one HTTP client
    let timeout = Duration::from_secs(config.provider_timeout_secs);
    let client = build_client(timeout)?;
    let providers: Vec<Arc<dyn JobProvider>> = vec![
        Arc::new(WebSearchProvider::new(client.clone(), config.web_search_enabled)),
        Arc::new(JSearchProvider::new(client.clone(), config.jsearch_api_key.clone())),
        Arc::new(AdzunaProvider::new(
            client,
            config.adzuna_app_id.clone(),
            config.adzuna_app_key.clone(),
        )),
    ];
    let retriever = MultiSourceRetriever::new(providers, timeout);
    info!(
        "Retriever ready: providers {:?}, timeout {}s, top_k {}",
        retriever.provider_names(),
        config.provider_timeout_secs,
        config.ranking_top_k
    );

    let engine = JobMatchEngine::new(
        retriever,
        RankingEngine::new(RankingWeights::default()),
        feedback.clone(),
        vocabulary,
        config.ranking_top_k,
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        engine: Arc::new(engine),
        feedback,
        cases: Arc::new(cases),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
