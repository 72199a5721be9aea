//! Bounded cache with LRU eviction and absolute TTL expiration
//!
//! Recency (LRU order) and freshness (TTL) are orthogonal and both enforced:
//! an entry can be evicted for being least recently used while well within
//! its TTL, and an entry past its TTL is treated as absent no matter how
//! recently it was touched. The TTL is absolute from insertion time, never
//! sliding.
//!
//! # Example
//!
//! ```rust
//! use gradestore::cache::LruCache;
//! use std::time::Duration;
//!
//! let cache = LruCache::new(2, Duration::from_secs(60)).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");
//! cache.put("c", 3); // "b" is least recently used and gets evicted
//!
//! assert!(cache.get(&"b").is_none());
//! assert_eq!(cache.get(&"a"), Some(1));
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::CacheError;

/// Cached value with insertion and access timestamps
struct Entry<V> {
    value: V,

    /// Stamped once at insertion; expiry is measured from here
    inserted_at: Instant,

    /// Refreshed on every hit and overwrite (LRU accounting)
    last_accessed: Instant,
}

impl<V> Entry<V> {
    fn new(value: V) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            last_accessed: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Map, capacity and TTL mutated under one lock
struct CacheInner<K, V> {
    entries: HashMap<K, Entry<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V> CacheInner<K, V> {
    fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| !e.is_expired(ttl));
    }

    /// Remove the entry with the oldest last access time
    fn evict_lru(&mut self) {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_accessed)
            .map(|(k, _)| k.clone());
        if let Some(key) = lru_key {
            self.entries.remove(&key);
            debug!("cache evicted least recently used entry");
        }
    }
}

/// Counter snapshot and configuration of an [`LruCache`]
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Live (non-expired) entries
    pub size: usize,
    /// Maximum entries
    pub capacity: usize,
    /// Total hits
    pub hits: u64,
    /// Total misses
    pub misses: u64,
    /// hits / (hits + misses), 0.0 when untouched
    pub hit_rate: f64,
    /// Current TTL
    pub ttl: Duration,
}

/// Fixed-capacity, TTL-expiring cache with strict LRU eviction
///
/// Thread-safe without external synchronization. Hit/miss counters are
/// incremented exactly once per [`get`](Self::get) call.
pub struct LruCache<K, V> {
    inner: Mutex<CacheInner<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache
    ///
    /// Fails with [`CacheError::InvalidCapacity`] for a zero capacity and
    /// [`CacheError::InvalidTtl`] for a zero TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        Ok(Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity),
                capacity,
                ttl,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Insert or overwrite a value
    ///
    /// When the cache is full and the key is new, the least recently used
    /// live entry is evicted first. Overwriting an existing key does not
    /// count against capacity; it refreshes recency and re-stamps the
    /// insertion time.
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        inner.purge_expired();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= inner.capacity {
            inner.evict_lru();
        }
        inner.entries.insert(key, Entry::new(value));
    }

    /// Look up a value
    ///
    /// Expired entries are removed lazily and count as misses. A hit
    /// refreshes the entry's recency.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;

        if let Some(entry) = inner.entries.get_mut(key) {
            if !entry.is_expired(ttl) {
                entry.last_accessed = Instant::now();
                let value = entry.value.clone();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
        }

        // Absent, or expired and purged lazily; either way a miss
        inner.entries.remove(key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Expiry-aware presence check; touches neither counters nor recency
    pub fn contains_key(&self, key: &K) -> bool {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;
        match inner.entries.get(key).map(|e| e.is_expired(ttl)) {
            Some(false) => true,
            Some(true) => {
                inner.entries.remove(key);
                false
            },
            None => false,
        }
    }

    /// Remove an entry, returning its value if it was live
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;
        inner
            .entries
            .remove(key)
            .filter(|e| !e.is_expired(ttl))
            .map(|e| e.value)
    }

    /// Drop all entries and reset the hit/miss counters
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of live entries (expired entries are purged before counting)
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.purge_expired();
        inner.entries.len()
    }

    /// Whether no live entries remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// hits / (hits + misses), 0.0 before any access
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Change the capacity, evicting LRU entries when shrinking
    pub fn set_capacity(&self, capacity: usize) -> Result<(), CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }
        let mut inner = self.inner.lock();
        inner.capacity = capacity;
        inner.purge_expired();
        while inner.entries.len() > capacity {
            inner.evict_lru();
        }
        Ok(())
    }

    /// Change the TTL for subsequent expiry checks
    ///
    /// Entries keep their original insertion timestamps; only the window
    /// they are measured against changes.
    pub fn set_ttl(&self, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        self.inner.lock().ttl = ttl;
        Ok(())
    }

    /// Counter snapshot and configuration
    ///
    /// Taken under one lock acquisition, so size and counters describe the
    /// same instant (counters only move while the lock is held).
    pub fn stats(&self) -> CacheStats {
        let mut inner = self.inner.lock();
        inner.purge_expired();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size: inner.entries.len(),
            capacity: inner.capacity,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            ttl: inner.ttl,
        }
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
