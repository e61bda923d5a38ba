//! In-memory cache with per-entry expiry.
//!
//! Entries are stored with an absolute deadline (`now + ttl`). There is no
//! size bound and no LRU policy: an entry disappears only when its deadline
//! passes or when it is cleared explicitly.
//!
//! ## Lazy Expiration
//!
//! Expiry is enforced on access only. Every [`TtlCache::get`] first sweeps
//! *all* expired entries, then looks up the requested key. The sweep and the
//! lookup happen under one write lock so concurrent tasks never observe a
//! half-swept map.
//!
//! ## Key Scoping
//!
//! Keys are plain strings. Callers give related keys a common prefix so a
//! whole group (one map location, one layer) can be dropped with
//! [`TtlCache::clear`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use once_cell::sync::Lazy;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// A cached value and its absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Hit/miss counters. Atomic so they can be read without the map lock.
#[derive(Debug, Default)]
pub struct TtlCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub expired: AtomicU64,
    pub cleared: AtomicU64,
}

impl TtlCacheStats {
    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Process-wide cache used when a caller does not inject its own.
static SHARED: Lazy<Arc<TtlCache<Bytes>>> = Lazy::new(|| Arc::new(TtlCache::new()));

/// Time-boxed key/value store.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    stats: TtlCacheStats,
}

impl TtlCache<Bytes> {
    /// The shared byte cache, so separate map instances reuse each other's
    /// downloads within one process.
    pub fn shared() -> Arc<TtlCache<Bytes>> {
        SHARED.clone()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: TtlCacheStats::default(),
        }
    }

    /// Store `value` under `key` until `now + ttl`, replacing any previous
    /// entry. Returns the stored value so fetch-and-cache can be chained.
    pub async fn add(&self, key: &str, value: V, ttl: Duration) -> V {
        let entry = CacheEntry {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        debug!(key = key, ttl_secs = ttl.as_secs(), "Cache entry stored");
        value
    }

    /// Look up `key`, after purging every expired entry in the cache.
    ///
    /// A miss is a normal outcome, not an error.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.write().await;

        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let swept = before - entries.len();
        if swept > 0 {
            self.stats.expired.fetch_add(swept as u64, Ordering::Relaxed);
            debug!(swept = swept, "Expired cache entries purged");
        }

        match entries.get(key) {
            Some(entry) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("radar_cache_hits_total").increment(1);
                Some(entry.value.clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("radar_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Remove every entry (`None`) or every entry whose key starts with
    /// `prefix`. Returns the number of entries removed.
    pub async fn clear(&self, prefix: Option<&str>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        match prefix {
            Some(prefix) => entries.retain(|key, _| !key.starts_with(prefix)),
            None => entries.clear(),
        }
        let removed = before - entries.len();
        self.stats.cleared.fetch_add(removed as u64, Ordering::Relaxed);
        debug!(prefix = prefix.unwrap_or("*"), removed = removed, "Cache cleared");
        removed
    }

    /// Number of stored entries, including ones that expired but have not
    /// been swept yet.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of the stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> &TtlCacheStats {
        &self.stats
    }
}
