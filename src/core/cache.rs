//! Thread-safe, fixed-capacity LRU cache (C2).
//!
//! A single mutex guards both the hash map and the recency list (the `lru`
//! crate bundles them into one structure), so a promoting `get` and an
//! evicting `put` are both atomic with respect to each other. Reads that
//! would otherwise need to mutate recency (`get`) take the same lock as
//! writes; `peek`/`contains` do not promote and are documented as such.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Default capacity used when a caller configures zero or a negative size.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Point-in-time hit/miss counters and occupancy for a cache instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
    pub capacity: usize,
}

struct Inner<K: Eq + Hash, V> {
    map: LruCache<K, V>,
    hits: u64,
    misses: u64,
}

/// A fixed-capacity, thread-safe LRU cache keyed by `K`.
pub struct Cache<K: Eq + Hash, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    /// Creates a cache with the given capacity. A capacity of 0 is
    /// normalized to [`DEFAULT_CACHE_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CACHE_CAPACITY
        } else {
            capacity
        };
        let cap = NonZeroUsize::new(capacity).unwrap();
        Cache {
            inner: Mutex::new(Inner {
                map: LruCache::new(cap),
                hits: 0,
                misses: 0,
            }),
            capacity,
        }
    }

    /// Fetches `key`, promoting it to most-recently-used. Counts toward
    /// `hits`/`misses`.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        let found = inner.map.get(key).cloned();
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Fetches `key` without affecting recency or counters.
    pub fn peek(&self, key: &K) -> Option<V> {
        let inner = self.inner.lock().unwrap();
        inner.map.peek(key).cloned()
    }

    /// Reports presence without affecting recency or counters.
    pub fn contains(&self, key: &K) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.map.contains(key)
    }

    /// Inserts or overwrites `key`, promoting it. Eviction of the
    /// least-recently-used entry happens inside `LruCache::put` once size
    /// exceeds capacity.
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock().unwrap();
        inner.map.put(key, value);
    }

    /// Removes `key` unconditionally, returning its value if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        inner.map.pop(key)
    }

    /// Drops all entries and zeroes the hit/miss counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.map.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        let total = inner.hits + inner.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            inner.hits as f64 / total as f64
        };
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            size: inner.map.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_zero_capacity() {
        let cache: Cache<u32, u32> = Cache::new(0);
        assert_eq!(cache.stats().capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn get_promotes_and_peek_does_not() {
        let cache: Cache<&str, i32> = Cache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        // peek b, then insert c: b should still be evicted because peek
        // doesn't promote, leaving insertion order a(lru) < b < c.
        assert_eq!(cache.peek(&"b"), Some(2));
        cache.put("c", 3);
        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn s4_lru_eviction_order() {
        // Scenario S4 from the spec: capacity 2, put a,b,c in order.
        let cache: Cache<&str, i32> = Cache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
        assert!(cache.contains(&"c"));

        // get(b) promotes it, then put(d) should evict c, not b.
        assert_eq!(cache.get(&"b"), Some(2));
        cache.put("d", 4);
        assert!(cache.contains(&"b"));
        assert!(!cache.contains(&"c"));
        assert!(cache.contains(&"d"));
    }

    #[test]
    fn idempotent_get_increments_hits_by_one() {
        let cache: Cache<&str, i32> = Cache::new(4);
        cache.put("a", 1);
        let stats_before = cache.stats();
        let first = cache.get(&"a");
        let second = cache.get(&"a");
        assert_eq!(first, second);
        let stats_after = cache.stats();
        assert_eq!(stats_after.hits, stats_before.hits + 2);
    }

    #[test]
    fn clear_resets_counters_and_entries() {
        let cache: Cache<&str, i32> = Cache::new(4);
        cache.put("a", 1);
        let _ = cache.get(&"a");
        let _ = cache.get(&"missing");
        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.size, 0);
    }
}
