use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::Config,
    db::{EmbeddedIndex, MovieIndex},
    routes::{create_router, AppState},
    services::{
        ingestion,
        providers::{EmbeddingProvider, OpenAiCompatibleClient, OpenAiCompatibleConfig},
        RecommendationPipeline, Reranker, RerankerOptions, RetryPolicy, Retriever,
    },
};

/// Builds the embedding client every entry point shares
pub fn embedding_client(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let client = OpenAiCompatibleClient::new(OpenAiCompatibleConfig {
        base_url: config.embedding_api_url.clone(),
        api_key: config.embedding_api_key.clone(),
        model: config.embedding_model.clone(),
        timeout: config.embedding_timeout(),
    })
    .context("Failed to initialize embedding client")?;

    Ok(Arc::new(client))
}

/// Opens the index snapshot written by `ingest`
pub async fn open_index(config: &Config) -> anyhow::Result<Arc<dyn MovieIndex>> {
    tracing::info!(path = %config.index_path.display(), "Loading vector index");

    let index = EmbeddedIndex::open(
        &config.index_path,
        embedding_client(config)?,
        &config.collection_name,
    )
    .await
    .context("Failed to open vector index")?;

    Ok(Arc::new(index))
}

/// Wires the retriever and reranker around an already-open index
pub fn build_pipeline(
    config: &Config,
    index: Arc<dyn MovieIndex>,
) -> anyhow::Result<RecommendationPipeline> {
    tracing::info!(model = %config.llm_model, url = %config.llm_api_url, "Connecting to completion API");

    let completion = OpenAiCompatibleClient::new(OpenAiCompatibleConfig {
        base_url: config.llm_api_url.clone(),
        api_key: Some(config.require_llm_api_key()?.to_string()),
        model: config.llm_model.clone(),
        timeout: config.llm_timeout(),
    })
    .context("Failed to initialize completion client")?;

    let options = RerankerOptions {
        timeout: config.llm_timeout(),
        retry: RetryPolicy::new(config.llm_max_retries, config.retry_backoff()),
        strict_selection: config.strict_selection,
    };

    Ok(RecommendationPipeline::new(
        Retriever::new(index),
        Reranker::new(Arc::new(completion), options),
        config.top_k,
    ))
}

/// Loads the seed catalogue into the snapshot at `INDEX_PATH`
pub async fn run_ingestion(config: &Config) -> anyhow::Result<usize> {
    tracing::info!(path = %config.index_path.display(), "Starting data ingestion");

    let index = EmbeddedIndex::open_or_create(
        &config.index_path,
        embedding_client(config)?,
        &config.collection_name,
    )
    .await
    .context("Failed to open vector index")?;

    let total = ingestion::ingest(&index, ingestion::seed_movies())
        .await
        .context("Failed to upsert seed movies")?;

    Ok(total)
}

/// HTTP server owning the shared pipeline
pub struct Application {
    config: Config,
    pipeline: RecommendationPipeline,
}

impl Application {
    /// Runs the startup sequence: index, then completion client, then pipeline
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let index = open_index(&config).await?;
        let pipeline = build_pipeline(&config, index)?;
        Ok(Self { config, pipeline })
    }

    /// Binds and serves until SIGINT/SIGTERM, letting in-flight requests finish
    pub async fn run(self) -> anyhow::Result<()> {
        let bind_address = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&bind_address)
            .await
            .with_context(|| format!("Failed to bind {}", bind_address))?;

        tracing::info!(address = %bind_address, "Server running");

        let app = create_router(Arc::new(AppState::new(self.pipeline)));
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        tracing::info!("Shutting down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
