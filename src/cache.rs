//! Memoization caches for the matching session
//!
//! Both caches are owned by a [`crate::matcher::MatchSession`] and live as long
//! as the session does. Entries never expire on their own: growth is bounded by
//! calling [`Cache::clear`] when the capture session is reset.
//!
//! ## Cache Types
//!
//! - **Similarity Cache**: `(candidate code, normalized OCR text)` to best similarity
//! - **Date Format Cache**: raw expiry string to its generated representations
//!
//! ## Usage Examples
//!
//! ```rust
//! use batch_match::cache::{Cache, SimilarityCache};
//!
//! let cache = SimilarityCache::new();
//! cache.insert(("AB1234".to_string(), "LOT AB1234".to_string()), 1.0);
//! assert_eq!(cache.get(&("AB1234".to_string(), "LOT AB1234".to_string())), Some(1.0));
//! ```

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::hash::Hash;

/// Generic cache trait
pub trait Cache<K, V> {
    /// Get a value from the cache
    fn get(&self, key: &K) -> Option<V>;

    /// Insert a fully computed value into the cache
    fn insert(&self, key: K, value: V);

    /// Get cache statistics
    fn stats(&self) -> CacheStats;

    /// Clear all entries and reset statistics
    fn clear(&self);
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Total number of entries
    pub entries: usize,
    /// Number of hits
    pub hits: u64,
    /// Number of misses
    pub misses: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

/// Thread-safe in-memory cache
///
/// Concurrent writers racing on the same key are harmless: values are pure
/// functions of their key, so the last write wins with an identical value.
pub struct MemoryCache<K, V> {
    name: &'static str,
    data: RwLock<HashMap<K, V>>,
    stats: Mutex<CacheStats>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Create a new cache; `name` labels its metrics
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            data: RwLock::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Get cache size
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Return the cached value, or compute, store and return it
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }

        let value = compute();
        self.insert(key, value.clone());
        value
    }
}

impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        let found = self.data.read().get(key).cloned();

        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.hits += 1;
            metrics::counter!("batch_match_cache_lookups_total", "cache" => self.name, "result" => "hit")
                .increment(1);
        } else {
            stats.misses += 1;
            metrics::counter!("batch_match_cache_lookups_total", "cache" => self.name, "result" => "miss")
                .increment(1);
        }

        found
    }

    fn insert(&self, key: K, value: V) {
        self.data.write().insert(key, value);
    }

    fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.entries = self.len();

        let total_requests = stats.hits + stats.misses;
        if total_requests > 0 {
            stats.hit_rate = stats.hits as f64 / total_requests as f64;
        }

        stats
    }

    fn clear(&self) {
        let mut data = self.data.write();
        let removed = data.len();
        data.clear();
        *self.stats.lock() = CacheStats::default();

        if removed > 0 {
            tracing::debug!(cache = self.name, removed, "Cache cleared");
        }
    }
}

/// Similarity cache key: `(candidate code, normalized OCR text)`
pub type SimilarityKey = (String, String);

/// Similarity cache: best locator score per candidate and OCR text
pub struct SimilarityCache(MemoryCache<SimilarityKey, f64>);

impl SimilarityCache {
    pub fn new() -> Self {
        Self(MemoryCache::new("similarity"))
    }
}

impl Default for SimilarityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache<SimilarityKey, f64> for SimilarityCache {
    fn get(&self, key: &SimilarityKey) -> Option<f64> {
        self.0.get(key)
    }

    fn insert(&self, key: SimilarityKey, value: f64) {
        self.0.insert(key, value)
    }

    fn stats(&self) -> CacheStats {
        self.0.stats()
    }

    fn clear(&self) {
        self.0.clear()
    }
}

/// Date format cache: raw expiry string to its ordered representations
pub struct DateFormatCache(MemoryCache<String, Vec<String>>);

impl DateFormatCache {
    pub fn new() -> Self {
        Self(MemoryCache::new("date_formats"))
    }

    /// Return cached formats for `raw`, or generate and store them
    pub fn get_or_insert_with<F>(&self, raw: &str, compute: F) -> Vec<String>
    where
        F: FnOnce() -> Vec<String>,
    {
        self.0.get_or_insert_with(raw.to_string(), compute)
    }
}

impl Default for DateFormatCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache<String, Vec<String>> for DateFormatCache {
    fn get(&self, key: &String) -> Option<Vec<String>> {
        self.0.get(key)
    }

    fn insert(&self, key: String, value: Vec<String>) {
        self.0.insert(key, value)
    }

    fn stats(&self) -> CacheStats {
        self.0.stats()
    }

    fn clear(&self) {
        self.0.clear()
    }
}
