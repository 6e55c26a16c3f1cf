//! Process Bootstrap (C10): reads layered CLI/env configuration and
//! constructs exactly one of the three roles, wiring each role's
//! collaborators before running until shutdown (spec §4.10).

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokenizers::Tokenizer;

use crate::api::ApiServer;
use crate::broker::{Broker, RedisBroker};
use crate::core::cli::Cli;
use crate::core::config::{AppConfig, StoreConfig};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::domain::Topic;
use crate::rag::{Chunker, ContactExtractor, Embedder, MemoryStore, PostgresStore, RagStage, RecordStore};
use crate::scrape::ScrapeStage;
use crate::worker::WorkerPool;

pub struct App;

impl App {
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        let cli = Cli::parse_args();
        let config = AppConfig::load(&cli)?;
        let shutdown = ShutdownService::new();
        shutdown.install_signal_handlers();

        let redis_url = config.redis().url();

        match config {
            AppConfig::Admission { admission, .. } => {
                let broker: Arc<dyn Broker> =
                    Arc::new(RedisBroker::new(&redis_url).await?);
                ApiServer::new(broker, admission, shutdown.clone())
                    .start()
                    .await?;
            }
            AppConfig::Scraper { worker, .. } => {
                let broker: Arc<dyn Broker> =
                    Arc::new(RedisBroker::new(&redis_url).await?);
                let stage = Arc::new(ScrapeStage::new(broker.clone()));
                let pool = WorkerPool::new(Topic::Urls, broker, stage, worker.concurrency);
                Self::run_pool(pool, &shutdown).await?;
            }
            AppConfig::Rag { worker, model, .. } => {
                let broker: Arc<dyn Broker> =
                    Arc::new(RedisBroker::new(&redis_url).await?);
                let tokenizer = Arc::new(
                    Tokenizer::from_file(&model.tokenizer_path)
                        .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?,
                );
                let mut embedder = Embedder::new(&model.embedding_model_path, tokenizer.clone())
                    .context("failed to initialize embedder")?;
                embedder
                    .embed("warmup")
                    .context("embedding model failed a warm-up check")?;
                let store = Self::build_store(&worker.store).await?;
                let stage = Arc::new(RagStage::new(
                    Chunker::new(tokenizer.clone()),
                    ContactExtractor::new(tokenizer),
                    embedder,
                    store,
                ));
                let pool = WorkerPool::new(Topic::Rag, broker, stage, worker.concurrency);
                Self::run_pool(pool, &shutdown).await?;
            }
        }

        shutdown.shutdown().await;
        Ok(())
    }

    async fn run_pool(pool: WorkerPool, shutdown: &ShutdownService) -> Result<()> {
        let (handles, mut err_rx) = pool.start(shutdown.subscribe());
        for handle in handles {
            shutdown.register(handle).await;
        }

        tokio::select! {
            pool_err = err_rx.recv() => {
                if let Some(e) = pool_err {
                    tracing::error!(error = %e, "worker pool terminated");
                }
                shutdown.trigger();
            }
            _ = shutdown.wait() => {}
        }

        Ok(())
    }

    async fn build_store(store: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
        if store.is_durable() {
            let url = store
                .supabase_url
                .as_deref()
                .context("SUPABASE_URL is required for a durable store")?;
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("failed to connect to Postgres")?;
            Ok(Arc::new(PostgresStore::new(pool)))
        } else {
            tracing::warn!("no SUPABASE_URL/SUPABASE_SERVICE_KEY configured, using in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}
