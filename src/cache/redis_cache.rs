// Redis-backed answer cache

use super::{AnswerCache, CacheKey};
use crate::models::CachedResult;
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

/// Answers stored as JSON strings with `SET key value EX ttl`.
#[derive(Clone)]
pub struct RedisAnswerCache {
    manager: ConnectionManager,
}

impl RedisAnswerCache {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        info!("Connected to Redis answer cache");
        Ok(Self { manager })
    }
}

/// Redis rejects `EX 0`, so sub-second TTLs round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl AnswerCache for RedisAnswerCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<CachedResult>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(key.as_str()).await?;

        raw.map(|payload| {
            serde_json::from_str(&payload)
                .map_err(|e| AppError::Cache(format!("Corrupt cache entry {}: {}", key, e)))
        })
        .transpose()
    }

    async fn set(&self, key: &CacheKey, value: &CachedResult, ttl: Duration) -> AppResult<()> {
        let payload = serde_json::to_string(value)
            .map_err(|e| AppError::Cache(format!("Failed to encode cache entry: {}", e)))?;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key.as_str(), payload, ttl_seconds(ttl))
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
