//! Answer cache
//!
//! Previously computed answers are stored under a digest of the normalized
//! question for a fixed time-to-live. Two backends are available:
//! - `RedisAnswerCache` - shared, process-external store (production)
//! - `MemoryAnswerCache` - in-process map with lazy expiry (no Redis, tests)

pub mod memory;
pub mod redis_cache;

pub use self::memory::MemoryAnswerCache;
pub use self::redis_cache::RedisAnswerCache;

use crate::models::CachedResult;
use crate::types::AppResult;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Namespace prefix for every key written by this service.
pub const KEY_NAMESPACE: &str = "pergunta_cache";

/// Lifetime of every cached answer.
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Lookup handle for a cached answer. Carries no meaning beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a question: trim, lower-case, SHA-256, prefix.
pub fn normalize(question: &str) -> CacheKey {
    let folded = question.trim().to_lowercase();
    let digest = Sha256::digest(folded.as_bytes());
    CacheKey(format!("{}:{}", KEY_NAMESPACE, hex::encode(digest)))
}

#[async_trait]
pub trait AnswerCache: Send + Sync {
    /// Returns `None` both for keys never written and for expired entries.
    async fn get(&self, key: &CacheKey) -> AppResult<Option<CachedResult>>;

    async fn set(&self, key: &CacheKey, value: &CachedResult, ttl: Duration) -> AppResult<()>;

    /// Backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
