use bluf_common::{BlufError, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Bounded LRU cache of summaries keyed by exact input content
///
/// Lookups that miss go through [`SummaryCache::get_or_try_insert_with`],
/// which lets only one caller per key run the provider call while the
/// others await its result.
pub struct SummaryCache {
    entries: Mutex<LruCache<String, String>>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
    /// Bumped by `clear`; results started in an older generation are not stored
    generation: AtomicU64,
}

impl SummaryCache {
    /// Create new cache holding at most `capacity` summaries
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| BlufError::invalid_input("cache capacity must be at least 1"))?;

        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        })
    }

    /// Cached summary, marking it most recently used
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Store a summary, evicting the least recently used entry when full
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().put(key.into(), value.into());
    }

    /// Drop every cached summary
    ///
    /// Calls already in flight still answer their callers, but their
    /// results are not cached.
    pub fn clear(&self) {
        let mut in_flight = self.in_flight.lock();
        let mut entries = self.entries.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.clear();
        in_flight.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Cached value, or the result of `init` shared by every concurrent
    /// caller with the same key. Failures are not cached.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: &str, init: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let (cell, generation) = {
            // lock order: in_flight, then entries
            let mut in_flight = self.in_flight.lock();
            if let Some(hit) = self.get(key) {
                return Ok(hit);
            }
            let cell = in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            (cell, self.generation.load(Ordering::SeqCst))
        };

        let result = cell.get_or_try_init(init).await.cloned();

        if let Ok(value) = &result {
            let mut entries = self.entries.lock();
            if self.generation.load(Ordering::SeqCst) == generation {
                entries.put(key.to_string(), value.clone());
            }
        }

        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            in_flight.remove(key);
        }

        result
    }
}
