//! Cache store backends.

use super::key::RequestKey;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// One cached response. Replaced wholesale on `put`; never partially mutated.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
    ttl: Option<Duration>,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(value: serde_json::Value, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            fetched_at: now,
            ttl,
            last_accessed: now,
        }
    }

    /// `ttl: None` entries live until explicitly invalidated.
    fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.fetched_at.elapsed() >= ttl,
            None => false,
        }
    }
}

/// Predicate used for endpoint-family invalidation.
pub type KeyMatcher<'a> = &'a (dyn Fn(&RequestKey) -> bool + Send + Sync);

/// Storage backend for cached responses.
///
/// Expiration is lazy: an expired entry is treated as absent on read and
/// dropped then; no background sweep runs.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the cached value only while the entry is fresh.
    async fn get(&self, key: &RequestKey) -> Option<serde_json::Value>;
    /// Overwrites unconditionally and resets the entry's fetch time.
    async fn put(&self, key: &RequestKey, value: serde_json::Value, ttl: Option<Duration>);
    /// Removes one entry; absent keys are not an error.
    async fn invalidate(&self, key: &RequestKey) -> bool;
    /// Removes every entry whose key matches; returns how many were dropped.
    async fn invalidate_matching(&self, matcher: KeyMatcher<'_>) -> usize;
    /// Removes all entries (session teardown).
    async fn clear(&self);
    /// Number of fresh entries.
    async fn len(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// In-memory store bounded by entry count, evicting least-recently-accessed
/// entries at capacity.
pub struct MemoryStore {
    entries: RwLock<HashMap<RequestKey, CacheEntry>>,
    max_entries: usize,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    fn evict_if_needed(&self, entries: &mut HashMap<RequestKey, CacheEntry>) {
        entries.retain(|_, e| !e.is_expired());
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &RequestKey) -> Option<serde_json::Value> {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            if entry.is_expired() {
                entries.remove(key);
                return None;
            }
            entry.last_accessed = Instant::now();
            return Some(entry.value.clone());
        }
        None
    }

    async fn put(&self, key: &RequestKey, value: serde_json::Value, ttl: Option<Duration>) {
        let mut entries = self.entries.write().unwrap();
        self.evict_if_needed(&mut entries);
        entries.insert(key.clone(), CacheEntry::new(value, ttl));
    }

    async fn invalidate(&self, key: &RequestKey) -> bool {
        self.entries.write().unwrap().remove(key).is_some()
    }

    async fn invalidate_matching(&self, matcher: KeyMatcher<'_>) -> usize {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|k, _| !matcher(k));
        before - entries.len()
    }

    async fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    async fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap()
            .values()
            .filter(|e| !e.is_expired())
            .count()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// No-op store for running with caching disabled: every read misses, every
/// write is discarded. In-flight de-duplication still applies above.
pub struct NullStore;

impl NullStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for NullStore {
    async fn get(&self, _: &RequestKey) -> Option<serde_json::Value> {
        None
    }

    async fn put(&self, _: &RequestKey, _: serde_json::Value, _: Option<Duration>) {}

    async fn invalidate(&self, _: &RequestKey) -> bool {
        false
    }

    async fn invalidate_matching(&self, _: KeyMatcher<'_>) -> usize {
        0
    }

    async fn clear(&self) {}

    async fn len(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
