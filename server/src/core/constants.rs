//! Process-wide constants and environment variable names

// =============================================================================
// Application identity
// =============================================================================

pub const APP_NAME_LOWER: &str = "crawlrag";

// =============================================================================
// Environment variables - logging
// =============================================================================

pub const ENV_LOG: &str = "CRAWLRAG_LOG";

// =============================================================================
// Environment variables - admission role
// =============================================================================

pub const ENV_HOST: &str = "CRAWLRAG_HOST";
pub const ENV_PORT: &str = "CRAWLRAG_PORT";
pub const ENV_SUPABASE_JWT_SECRET: &str = "SUPABASE_JWT_SECRET";

// =============================================================================
// Environment variables - broker (Redis)
// =============================================================================

pub const ENV_REDIS_ADDRESS: &str = "REDIS_ADDRESS";
pub const ENV_REDIS_ADDR: &str = "REDIS_ADDR";
pub const ENV_REDIS_PASSWORD: &str = "REDIS_PASSWORD";
pub const ENV_REDIS_DB: &str = "REDIS_DB";

// =============================================================================
// Environment variables - worker role
// =============================================================================

pub const ENV_WORKER_TYPE: &str = "WORKER_TYPE";
pub const ENV_CONCURRENCY: &str = "CONCURRENCY";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
pub const ENV_EMBEDDING_MODEL_PATH: &str = "EMBEDDING_MODEL_PATH";
pub const ENV_TOKENIZER_PATH: &str = "TOKENIZER_PATH";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_REDIS_DB: i64 = 0;
pub const DEFAULT_SCRAPER_CONCURRENCY: usize = 4;
pub const DEFAULT_EMBEDDING_MODEL_PATH: &str = "models/embedder.onnx";
pub const DEFAULT_TOKENIZER_PATH: &str = "models/tokenizer.json";

/// The rag pool's worker count is intentionally not configurable; see DESIGN.md.
pub const RAG_POOL_CONCURRENCY: usize = 1;

// =============================================================================
// Queue / worker timing
// =============================================================================

pub const CLAIM_TIMEOUT_SECS: u64 = 3;
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Chunking / embedding
// =============================================================================

pub const CHUNK_MAX_TOKENS: usize = 256;
pub const CHUNK_OVERLAP_TOKENS: usize = 50;
pub const MODEL_MAX_TOKENS: usize = 512;
pub const EMBEDDING_DIM: usize = 384;

// =============================================================================
// Admission limits
// =============================================================================

pub const MIN_URLS_PER_BATCH: usize = 1;
pub const MAX_URLS_PER_BATCH: usize = 500;

pub const CREATED_BY_ADMISSION: &str = "coordinator-client";
