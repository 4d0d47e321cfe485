use std::sync::Arc;

use rig::client::{EmbeddingsClient, ProviderClient};
use rig::providers::openai;
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use pagesift::chunking::Chunker;
use pagesift::config::ServerConfig;
use pagesift::embeddings::{Embedder, RigEmbedder};
use pagesift::extract::TextExtractor;
use pagesift::fetch::PageFetcher;
use pagesift::pipeline::SearchPipeline;
use pagesift::server;
use pagesift::stores::SqliteVectorIndex;
use pagesift::tokens::TiktokenCounter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = ServerConfig::from_env();

    // Requires OPENAI_API_KEY (resolved via .env or the environment).
    let openai = openai::Client::from_env();
    let model = openai.embedding_model(openai::TEXT_EMBEDDING_3_SMALL);
    let embedder = Arc::new(RigEmbedder::new(model));
    tracing::info!(dimensions = embedder.dimensions(), "embedding model ready");

    let counter = Arc::new(TiktokenCounter::new()?);
    let store = Arc::new(SqliteVectorIndex::open(&config.db_path).await?);
    tracing::info!(db_path = %config.db_path, "vector store opened");

    let pipeline = SearchPipeline::new(
        PageFetcher::new()?,
        TextExtractor::new(),
        Chunker::new(counter),
        embedder,
        store,
    )
    .with_max_tokens(config.max_tokens)
    .with_top_k(config.top_k);

    let router = server::router(Arc::new(pipeline));
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("serving on http://{}", config.bind_addr);
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
