//! In-process result cache.
//!
//! Only the in-memory backend exists; a config asking for anything else is
//! refused at construction.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CacheConfig;
use crate::constants::{CACHE_KEY_PREFIX, QUERY_RESULTS_TTL_SECS};
use crate::error::{PipelineError, Result};
use crate::types::ProductRecord;

/// Key/value store with per-entry expiry.
pub trait Cache: Send {
    fn get(&mut self, key: &str) -> Option<Value>;

    /// Store `value`; `None` uses the backend's default TTL
    fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> bool;

    fn delete(&mut self, key: &str) -> bool;

    fn exists(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn clear(&mut self) -> bool;

    /// Entries currently held, expired ones included until they are next touched
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    /// `None` when the TTL runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// HashMap-backed cache. Expired entries are dropped lazily on access.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: HashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl MemoryCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    /// Drop every expired entry now
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }
}

impl Cache for MemoryCache {
    fn get(&mut self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!("Cache entry {} expired", key);
            self.entries.remove(key);
        }
        None
    }

    fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        true
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn clear(&mut self) -> bool {
        self.entries.clear();
        true
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// `priceiq:` followed by the sha256 hex of the `:`-joined parts
pub fn cache_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join(":").as_bytes());
    format!("{}:{}", CACHE_KEY_PREFIX, hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub entries: usize,
}

/// Domain-level operations over a [`Cache`]: query results and product pages.
pub struct CacheManager<C: Cache = MemoryCache> {
    cache: C,
}

impl<C: Cache> CacheManager<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    fn query_key(query: &str, country: &str) -> String {
        cache_key(&["query", query, country])
    }

    fn product_key(url: &str) -> String {
        cache_key(&["product", url])
    }

    pub fn cache_query_results(
        &mut self,
        query: &str,
        country: &str,
        results: &[ProductRecord],
        ttl: Option<Duration>,
    ) -> bool {
        let value = json!({
            "results": results,
            "timestamp": Utc::now().to_rfc3339(),
            "query": query,
            "country": country,
        });
        let ttl = ttl.unwrap_or(Duration::from_secs(QUERY_RESULTS_TTL_SECS));
        self.cache.set(&Self::query_key(query, country), value, Some(ttl))
    }

    pub fn get_cached_query_results(&mut self, query: &str, country: &str) -> Option<Vec<ProductRecord>> {
        let mut value = self.cache.get(&Self::query_key(query, country))?;
        serde_json::from_value(value.get_mut("results")?.take()).ok()
    }

    pub fn invalidate_query_cache(&mut self, query: &str, country: &str) -> bool {
        self.cache.delete(&Self::query_key(query, country))
    }

    pub fn cache_product_data(&mut self, url: &str, record: &ProductRecord, ttl: Option<Duration>) -> bool {
        match serde_json::to_value(record) {
            Ok(value) => self.cache.set(&Self::product_key(url), value, ttl),
            Err(_) => false,
        }
    }

    pub fn get_cached_product_data(&mut self, url: &str) -> Option<ProductRecord> {
        let value = self.cache.get(&Self::product_key(url))?;
        serde_json::from_value(value).ok()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            backend: self.cache.backend(),
            entries: self.cache.len(),
        }
    }

    pub fn cache_mut(&mut self) -> &mut C {
        &mut self.cache
    }
}

/// Build the configured cache. Only the in-memory backend is available.
pub fn create_cache_manager(config: &CacheConfig) -> Result<CacheManager<MemoryCache>> {
    if !config.use_mock {
        return Err(PipelineError::CapabilityNotImplemented { component: "cache" });
    }
    Ok(CacheManager::new(MemoryCache::new(Duration::from_secs(
        config.ttl_default,
    ))))
}
