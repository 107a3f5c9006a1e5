//! Time-expiring cache for aggregate query results.
//!
//! Lookups and writes take the lock separately; the value is computed with
//! the lock released, so two concurrent misses on one key may both compute
//! and the later write wins.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

struct CacheEntry {
    stored_at: Instant,
    value: Arc<dyn Any + Send + Sync>,
}

pub struct ResultCache {
    timeout: Duration,
    enabled: bool,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ResultCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            enabled: true,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A cache that never stores anything; every lookup recomputes.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.enabled {
            return None;
        }

        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.timeout {
            entries.remove(key);
            return None;
        }

        let cached = entry.value.downcast_ref::<T>().cloned();
        if cached.is_none() {
            warn!(key, "cached value has unexpected type; discarding");
            entries.remove(key);
        }
        cached
    }

    pub fn set<T>(&self, key: &str, value: T)
    where
        T: Send + Sync + 'static,
    {
        if !self.enabled {
            return;
        }

        self.lock().insert(
            key.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                value: Arc::new(value),
            },
        );
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    /// Errors from `compute` are returned without touching the cache.
    pub fn get_or_try_insert_with<T, E, F>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get::<T>(key) {
            debug!(key, "cache hit");
            return Ok(value);
        }

        debug!(key, "cache miss; recomputing");
        let value = compute()?;
        self.set(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
