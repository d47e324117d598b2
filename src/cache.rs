//! In-memory caches for geocode and forecast results
//!
//! Resolvers only see the [`Cache`] trait. The default implementation is an
//! unbounded map shared by the whole process; [`BoundedCache`] swaps in an LRU
//! bound without touching resolver code. Entries are replaced wholesale, never
//! mutated in place.

use crate::models::{GeocodeResult, WeatherData};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

static GEOCODE_CACHE: LazyLock<Arc<MemoryCache<GeocodeResult>>> =
    LazyLock::new(|| Arc::new(MemoryCache::new()));

static FORECAST_CACHE: LazyLock<Arc<MemoryCache<WeatherData>>> =
    LazyLock::new(|| Arc::new(MemoryCache::new()));

/// Key/value store used by the resolvers
pub trait Cache<V>: Send + Sync {
    /// Look up a value, counting the hit or miss
    fn get(&self, key: &str) -> Option<V>;

    /// Look up a value without touching the counters or recency
    fn peek(&self, key: &str) -> Option<V>;

    /// Insert or replace a value
    fn put(&self, key: String, value: V);

    /// Number of entries currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters
    fn stats(&self) -> CacheStats;
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate as a percentage (0-100)
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// Unbounded map without TTL or eviction
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<String, V>>,
    counters: Counters,
}

impl<V> MemoryCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let value = lock(&self.entries).get(key).cloned();
        self.counters.record(value.is_some());
        value
    }

    fn peek(&self, key: &str) -> Option<V> {
        lock(&self.entries).get(key).cloned()
    }

    fn put(&self, key: String, value: V) {
        lock(&self.entries).insert(key, value);
    }

    fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }
}

/// LRU-bounded cache
#[derive(Debug)]
pub struct BoundedCache<V> {
    entries: Mutex<LruCache<String, V>>,
    counters: Counters,
}

impl<V> BoundedCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        tracing::debug!("Bounded cache initialized: capacity={}", capacity);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            counters: Counters::default(),
        }
    }

    /// Insert, returning the key pushed out by the capacity bound if any
    fn insert(&self, key: String, value: V) -> Option<String> {
        let mut entries = lock(&self.entries);
        if entries.contains(&key) {
            entries.put(key, value);
            return None;
        }
        entries.push(key, value).map(|(evicted, _)| evicted)
    }
}

impl<V: Clone + Send> Cache<V> for BoundedCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let value = lock(&self.entries).get(key).cloned();
        self.counters.record(value.is_some());
        value
    }

    fn peek(&self, key: &str) -> Option<V> {
        lock(&self.entries).peek(key).cloned()
    }

    fn put(&self, key: String, value: V) {
        if let Some(evicted) = self.insert(key, value) {
            tracing::trace!("Evicted cache entry: {}", evicted);
        }
    }

    fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }
}

/// Process-wide geocode cache
#[must_use]
pub fn global_geocode_cache() -> Arc<dyn Cache<GeocodeResult>> {
    let cache: Arc<MemoryCache<GeocodeResult>> = Arc::clone(&GEOCODE_CACHE);
    cache
}

/// Process-wide forecast cache
#[must_use]
pub fn global_forecast_cache() -> Arc<dyn Cache<WeatherData>> {
    let cache: Arc<MemoryCache<WeatherData>> = Arc::clone(&FORECAST_CACHE);
    cache
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
