mod config;
mod db;
mod documents;
mod errors;
mod evaluation;
mod jobs;
mod llm_client;
mod models;
mod retrieval;
mod routes;
mod state;

#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ContextIndexConfig};
use crate::db::create_pool;
use crate::documents::extract::PdfTextExtractor;
use crate::documents::storage::ObjectStorage;
use crate::documents::store::PgDocumentStore;
use crate::evaluation::worker::{EvaluationWorker, WorkerDeps, WorkerSettings};
use crate::jobs::queue::RedisJobQueue;
use crate::jobs::store::PgJobStore;
use crate::llm_client::LlmClient;
use crate::retrieval::qdrant::QdrantIndex;
use crate::retrieval::{fallback, ContextRetriever};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let storage = ObjectStorage::new(s3, config.s3_bucket.clone());
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let retriever = match &config.context_index {
        Some(index_config) => build_retriever(index_config).await,
        None => {
            info!("No context index configured, using built-in reference texts");
            ContextRetriever::fixed()
        }
    };

    let jobs = Arc::new(PgJobStore::new(db.clone()));
    let documents = Arc::new(PgDocumentStore::new(db));
    let queue = Arc::new(RedisJobQueue::connect(redis).await?);
    info!("Redis queue connections established");

    let worker = EvaluationWorker::new(
        WorkerDeps {
            jobs: jobs.clone(),
            documents: documents.clone(),
            queue: queue.clone(),
            extractor: Arc::new(PdfTextExtractor::new(storage.clone())),
            model: llm,
            retriever: retriever.clone(),
        },
        WorkerSettings {
            poll_timeout: config.queue_poll_timeout,
            job_timeout: config.job_timeout,
        },
    );
    let worker_running = worker.running_flag();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    let state = AppState {
        jobs,
        documents,
        queue,
        storage,
        retriever,
        worker_running,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, waiting for worker to finish its current job");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        warn!("Worker task ended abnormally: {e}");
    }

    Ok(())
}

/// Connects to the vector index, falling back to the fixed reference texts
/// when it cannot be prepared.
async fn build_retriever(config: &ContextIndexConfig) -> ContextRetriever {
    let index = match QdrantIndex::new(config) {
        Ok(index) => index,
        Err(e) => {
            warn!("Context index misconfigured, using built-in reference texts: {e:#}");
            return ContextRetriever::fixed();
        }
    };

    if let Err(e) = index.ensure_collection().await {
        warn!("Context index unavailable, using built-in reference texts: {e:#}");
        return ContextRetriever::fixed();
    }

    if config.seed {
        match index.seed(&fallback::reference_corpus()).await {
            Ok(count) => info!("Seeded {count} reference documents into '{}'", config.collection),
            Err(e) => warn!("Seeding context index failed: {e:#}"),
        }
    }

    info!("Context index ready (collection: {})", config.collection);
    ContextRetriever::indexed(Arc::new(index))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl+c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "screener-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
