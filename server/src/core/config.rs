//! Layered application configuration
//!
//! Values are sourced from CLI flags (which themselves fall back to environment
//! variables via `clap`'s `env = ...` bindings) with hard-coded defaults as the
//! final fallback. There is no config-file layer; the source system configures
//! every role purely from the process environment (see spec §6).

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::{Cli, Role};
use super::constants::{
    DEFAULT_EMBEDDING_MODEL_PATH, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REDIS_DB,
    DEFAULT_SCRAPER_CONCURRENCY, DEFAULT_TOKENIZER_PATH, RAG_POOL_CONCURRENCY,
};

/// Redis connection parameters, shared by every role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub address: String,
    pub password: Option<String>,
    pub db: i64,
}

impl RedisConfig {
    /// `redis://[:password@]host:port/db`
    pub fn url(&self) -> String {
        match &self.password {
            Some(pw) if !pw.is_empty() => format!("redis://:{}@{}/{}", pw, self.address, self.db),
            _ => format!("redis://{}/{}", self.address, self.db),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: Option<String>,
}

impl fmt::Display for AdmissionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
}

impl StoreConfig {
    pub fn is_durable(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_service_key.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub store: StoreConfig,
}

/// Embedder/tokenizer asset paths. Only consulted by the rag role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub embedding_model_path: String,
    pub tokenizer_path: String,
}

/// Fully resolved configuration for exactly one process role.
#[derive(Debug, Clone)]
pub enum AppConfig {
    Admission {
        redis: RedisConfig,
        admission: AdmissionConfig,
    },
    Scraper {
        redis: RedisConfig,
        worker: WorkerConfig,
    },
    Rag {
        redis: RedisConfig,
        worker: WorkerConfig,
        model: ModelConfig,
    },
}

impl AppConfig {
    pub fn load(cli: &Cli) -> Result<Self> {
        tracing::debug!(role = ?cli.role, "Loading application configuration");

        let redis = RedisConfig {
            address: cli
                .redis_address()
                .map(str::to_string)
                .context("REDIS_ADDRESS (or REDIS_ADDR) is required")?,
            password: cli.redis_password.clone(),
            db: cli.redis_db.unwrap_or(DEFAULT_REDIS_DB),
        };

        match cli.role {
            Role::Admission => {
                let (host, port) = match &cli.listen {
                    Some(listen) => parse_listen(listen)?,
                    None => (
                        cli.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
                        cli.port.unwrap_or(DEFAULT_PORT),
                    ),
                };
                Ok(Self::Admission {
                    redis,
                    admission: AdmissionConfig {
                        host,
                        port,
                        jwt_secret: std::env::var(super::constants::ENV_SUPABASE_JWT_SECRET).ok(),
                    },
                })
            }
            Role::Scraper => Ok(Self::Scraper {
                redis,
                worker: WorkerConfig {
                    concurrency: cli.concurrency.unwrap_or(DEFAULT_SCRAPER_CONCURRENCY),
                    store: store_config(),
                },
            }),
            Role::Rag => Ok(Self::Rag {
                redis,
                worker: WorkerConfig {
                    // Intentionally ignores cli.concurrency; see DESIGN.md.
                    concurrency: RAG_POOL_CONCURRENCY,
                    store: store_config(),
                },
                model: ModelConfig {
                    embedding_model_path: std::env::var(
                        super::constants::ENV_EMBEDDING_MODEL_PATH,
                    )
                    .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL_PATH.to_string()),
                    tokenizer_path: std::env::var(super::constants::ENV_TOKENIZER_PATH)
                        .unwrap_or_else(|_| DEFAULT_TOKENIZER_PATH.to_string()),
                },
            }),
        }
    }

    pub fn redis(&self) -> &RedisConfig {
        match self {
            Self::Admission { redis, .. } => redis,
            Self::Scraper { redis, .. } => redis,
            Self::Rag { redis, .. } => redis,
        }
    }
}

fn store_config() -> StoreConfig {
    StoreConfig {
        supabase_url: std::env::var(super::constants::ENV_SUPABASE_URL).ok(),
        supabase_service_key: std::env::var(super::constants::ENV_SUPABASE_SERVICE_KEY).ok(),
    }
}

fn parse_listen(listen: &str) -> Result<(String, u16)> {
    let listen = listen.strip_prefix(':').unwrap_or(listen);
    match listen.rsplit_once(':') {
        Some((host, port)) => Ok((
            host.to_string(),
            port.parse().context("invalid port in --listen")?,
        )),
        None => Ok((
            DEFAULT_HOST.to_string(),
            listen.parse().context("invalid port in --listen")?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_url_without_password() {
        let redis = RedisConfig {
            address: "localhost:6379".to_string(),
            password: None,
            db: 0,
        };
        assert_eq!(redis.url(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_redis_url_with_password() {
        let redis = RedisConfig {
            address: "localhost:6379".to_string(),
            password: Some("secret".to_string()),
            db: 2,
        };
        assert_eq!(redis.url(), "redis://:secret@localhost:6379/2");
    }

    #[test]
    fn test_parse_listen_with_host() {
        assert_eq!(
            parse_listen("0.0.0.0:8080").unwrap(),
            ("0.0.0.0".to_string(), 8080)
        );
    }

    #[test]
    fn test_parse_listen_port_only() {
        assert_eq!(
            parse_listen(":80").unwrap(),
            (DEFAULT_HOST.to_string(), 80)
        );
    }

    #[test]
    fn test_store_is_durable_requires_both_fields() {
        let mut store = StoreConfig {
            supabase_url: Some("https://x.supabase.co".to_string()),
            supabase_service_key: None,
        };
        assert!(!store.is_durable());
        store.supabase_service_key = Some("key".to_string());
        assert!(store.is_durable());
    }
}
