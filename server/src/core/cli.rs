//! Command-line interface

use clap::{Parser, ValueEnum};

use super::constants::{
    ENV_CONCURRENCY, ENV_HOST, ENV_PORT, ENV_REDIS_ADDR, ENV_REDIS_ADDRESS, ENV_REDIS_DB,
    ENV_REDIS_PASSWORD, ENV_WORKER_TYPE,
};

/// Which role this process constructs (Process Bootstrap, C10).
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum Role {
    Admission,
    Scraper,
    Rag,
}

#[derive(Parser, Clone, Debug)]
#[command(name = "crawlrag")]
#[command(version, about = "Web crawl + RAG indexing pipeline", long_about = None)]
pub struct Cli {
    /// Which role this process runs as.
    #[arg(long, value_enum, env = ENV_WORKER_TYPE, default_value = "admission")]
    pub role: Role,

    /// Listen address for the admission role (host:port).
    #[arg(long, short = 'l')]
    pub listen: Option<String>,

    /// Admission HTTP host.
    #[arg(long, env = ENV_HOST)]
    pub host: Option<String>,

    /// Admission HTTP port.
    #[arg(long, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Redis address used by the admission role.
    #[arg(long, env = ENV_REDIS_ADDRESS)]
    pub redis_address: Option<String>,

    /// Redis address used by worker roles.
    #[arg(long, env = ENV_REDIS_ADDR)]
    pub redis_addr: Option<String>,

    /// Redis password (shared by all roles).
    #[arg(long, env = ENV_REDIS_PASSWORD)]
    pub redis_password: Option<String>,

    /// Redis logical database index.
    #[arg(long, env = ENV_REDIS_DB)]
    pub redis_db: Option<i64>,

    /// Scraper pool worker count. Ignored by the rag role (see DESIGN.md).
    #[arg(long, env = ENV_CONCURRENCY)]
    pub concurrency: Option<usize>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Redis address, resolving the role-specific env var aliases used by the source system.
    pub fn redis_address(&self) -> Option<&str> {
        self.redis_address
            .as_deref()
            .or(self.redis_addr.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_from_kebab_case() {
        assert_eq!(Role::from_str("scraper", true), Ok(Role::Scraper));
        assert_eq!(Role::from_str("rag", true), Ok(Role::Rag));
        assert_eq!(Role::from_str("admission", true), Ok(Role::Admission));
    }

    #[test]
    fn test_redis_address_prefers_primary_env_alias() {
        let cli = Cli {
            role: Role::Admission,
            listen: None,
            host: None,
            port: None,
            redis_address: Some("redis-a:6379".to_string()),
            redis_addr: Some("redis-b:6379".to_string()),
            redis_password: None,
            redis_db: None,
            concurrency: None,
        };
        assert_eq!(cli.redis_address(), Some("redis-a:6379"));
    }
}
