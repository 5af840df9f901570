//! Query result cache.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::query::ParamQuery;
use crate::Record;

/// Default number of cached result sets.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store for query results. Failures are never fatal to the
/// caller; the unit of work logs and ignores them.
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<Record>>, CacheError>;

    async fn set(&self, key: &str, rows: Vec<Record>) -> Result<(), CacheError>;
}

/// Cache key for a statement: its text plus its serialized parameters, so
/// the same text with different bound values never collides.
pub fn cache_key(query: &ParamQuery) -> String {
    let values = serde_json::to_string(&query.values).unwrap_or_default();
    format!("{}|{values}", query.text)
}

/// In-process LRU cache with a global on/off switch.
pub struct MemCache {
    entries: Mutex<LruCache<String, Vec<Record>>>,
    enabled: AtomicBool,
}

impl MemCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CacheService for MemCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<Record>>, CacheError> {
        if !self.is_enabled() {
            return Ok(None);
        }
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, rows: Vec<Record>) -> Result<(), CacheError> {
        if self.is_enabled() {
            self.entries.lock().await.put(key.to_string(), rows);
        }
        Ok(())
    }
}

/// A cache that never holds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl CacheService for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<Record>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _rows: Vec<Record>) -> Result<(), CacheError> {
        Ok(())
    }
}
