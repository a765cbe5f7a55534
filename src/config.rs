use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

/// Tables the service is allowed to describe to the SQL agent.
pub const DEFAULT_TABLES: &[&str] = &[
    "SE1010", "SB1010", "SA1010", "SD1010", "SF2010", "SF1010", "SE2010",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub llm: LLMConfig,
    pub sql: SqlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub include_tables: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

impl LLMConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqlConfig {
    pub read_only: bool,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: split_list(
                    &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("DB_MAX_CONNECTIONS must be an integer")?,
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .context("DB_MIN_CONNECTIONS must be an integer")?,
                include_tables: env::var("DB_INCLUDE_TABLES")
                    .map(|raw| split_list(&raw))
                    .unwrap_or_else(|_| DEFAULT_TABLES.iter().map(|t| t.to_string()).collect()),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                enabled: env::var("USE_REDIS_CACHE")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .context("USE_REDIS_CACHE must be true or false")?,
            },
            llm: LLMConfig {
                api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| crate::llm::openai::OPENAI_API_BASE.to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
                embedding_model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                temperature: env::var("LLM_TEMPERATURE")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .context("LLM_TEMPERATURE must be a number")?,
            },
            sql: SqlConfig {
                read_only: env::var("SQL_READ_ONLY")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .context("SQL_READ_ONLY must be true or false")?,
            },
        })
    }
}
