//! Bounded LRU caching
//!
//! Provides the cache used by the executor for operation results and by
//! templates for derived metrics:
//!
//! - LRU (Least Recently Used) eviction policy
//! - Cache hit/miss statistics
//! - Manual invalidation (full clear or per key)
//!
//! Recency is tracked with a monotonic access counter rather than wall-clock
//! time, so eviction order is deterministic. Callers that need sharing wrap
//! the cache in their own lock.

use std::collections::HashMap;
use std::hash::Hash;

/// A cached value with recency metadata
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    last_accessed: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries currently in cache
    pub entries: usize,
    /// Number of entries evicted
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// A bounded LRU cache
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    capacity: usize,
    clock: u64,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        LruCache {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Look up a key, refreshing its recency on a hit
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.clock += 1;
        let clock = self.clock;
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed = clock;
                self.stats.hits += 1;
                Some(entry.value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a value, evicting the least recently used entry when full
    pub fn put(&mut self, key: K, value: V) {
        self.clock += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_accessed: self.clock,
            },
        );
        self.stats.entries = self.entries.len();
    }

    /// Remove a single key
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key).map(|e| e.value);
        self.stats.entries = self.entries.len();
        removed
    }

    /// Drop every entry, keeping the statistics counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.entries = 0;
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the statistics
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_accessed)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let mut cache: LruCache<String, u32> = LruCache::new(4);
        cache.put("a".into(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        cache.put(1, 10);
        cache.put(2, 20);
        // touch 1 so 2 becomes the eviction candidate
        cache.get(&1);
        cache.put(3, 30);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&3), Some(30));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(1, 11);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), Some(11));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        cache.put(1, 10);
        cache.get(&1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_hit_rate() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        cache.put(1, 10);
        cache.get(&1);
        cache.get(&1);
        cache.get(&2);
        let rate = cache.stats().hit_rate();
        assert!((rate - 66.666).abs() < 0.1);
    }
}
