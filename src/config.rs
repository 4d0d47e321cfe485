//! Environment-driven server configuration.

use std::str::FromStr;

use crate::chunking::DEFAULT_MAX_TOKENS;
use crate::retrieve::DEFAULT_TOP_K;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: String,
    pub max_tokens: usize,
    pub top_k: usize,
}

impl ServerConfig {
    /// Resolves configuration from the environment, loading `.env` first.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            bind_addr: env_or("PAGESIFT_BIND_ADDR", "0.0.0.0:8000"),
            db_path: env_or("PAGESIFT_DB_PATH", "pagesift.db"),
            max_tokens: env_parsed("PAGESIFT_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            top_k: env_parsed("PAGESIFT_TOP_K", DEFAULT_TOP_K),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
