//! # In-Memory Entry Store
//!
//! Bounded, in-process storage with per-entry TTL and true LRU eviction (by
//! recency of access, not insertion). Expiry is lazy: `get`/`has` drop an
//! expired entry and report a miss, `sweep_expired` is available for periodic
//! cleanup.
//!
//! **Important**: This store is NOT distributed. Each process maintains its
//! own entries.

use super::entry::CacheEntry;
use super::traits::{pattern_matches, StorageAdapter};
use crate::error::{CacheError, CacheResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct StoredEntry<V> {
    entry: CacheEntry<V>,
    /// Monotonic access sequence, breaks `last_access_at` ties
    recency: u64,
}

/// Entries plus a recency index
///
/// Every access bumps the sequence under the lock, so ascending `recency`
/// is ascending `last_access_at` and the first index entry is the LRU victim.
#[derive(Debug)]
struct StoreInner<V> {
    entries: HashMap<String, StoredEntry<V>>,
    by_recency: BTreeMap<u64, String>,
    next_recency: u64,
}

impl<V> StoreInner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            by_recency: BTreeMap::new(),
            next_recency: 0,
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_recency += 1;
        self.next_recency
    }

    fn insert(&mut self, key: &str, entry: CacheEntry<V>) {
        self.remove(key);
        let recency = self.bump();
        self.by_recency.insert(recency, key.to_string());
        self.entries
            .insert(key.to_string(), StoredEntry { entry, recency });
    }

    fn remove(&mut self, key: &str) -> Option<StoredEntry<V>> {
        let stored = self.entries.remove(key)?;
        self.by_recency.remove(&stored.recency);
        Some(stored)
    }

    /// Touch an entry and move it to the most recent end of the index
    fn touch(&mut self, key: &str) -> Option<&CacheEntry<V>> {
        let recency = self.bump();
        let stored = self.entries.get_mut(key)?;
        self.by_recency.remove(&stored.recency);
        self.by_recency.insert(recency, key.to_string());
        stored.recency = recency;
        stored.entry.touch();
        Some(&stored.entry)
    }

    fn evict_least_recent(&mut self) -> Option<String> {
        let (_, victim) = self.by_recency.pop_first()?;
        self.entries.remove(&victim);
        Some(victim)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.by_recency.clear();
    }
}

/// Store counters for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entries: usize,
    pub capacity: usize,
    pub evictions: u64,
    pub expirations: u64,
}

/// In-memory cache store with TTL and LRU eviction
#[derive(Debug)]
pub struct MemoryStore<V> {
    inner: Mutex<StoreInner<V>>,
    max_entries: usize,
    default_ttl: Option<Duration>,
    connected: AtomicBool,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<V: Clone> MemoryStore<V> {
    /// Create a store holding at most `max_entries` entries
    ///
    /// `default_ttl` applies to entries set without an explicit TTL.
    pub fn new(max_entries: usize, default_ttl: Option<Duration>) -> Self {
        debug!(
            max_entries = max_entries,
            default_ttl_ms = default_ttl.map(|ttl| ttl.as_millis() as u64),
            "Memory store created"
        );

        Self {
            inner: Mutex::new(StoreInner::new()),
            max_entries: max_entries.max(1),
            default_ttl,
            connected: AtomicBool::new(true),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Insert or replace a value
    ///
    /// Inserting a new key into a full store first evicts the entry with the
    /// oldest `last_access_at`.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        let ttl = ttl.or(self.default_ttl);
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_entries {
            if let Some(evicted) = inner.evict_least_recent() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }

        inner.insert(key, CacheEntry::new(key.to_string(), value, ttl));
    }

    /// Get a live value, refreshing its access bookkeeping
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let expired = inner.entries.get(key)?.entry.is_expired_at(now);
        if expired {
            inner.remove(key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            debug!(key = key, "Entry expired on read");
            return None;
        }

        inner.touch(key).map(|entry| entry.value.clone())
    }

    /// Check for a live entry without touching it
    pub fn has(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(stored) if stored.entry.is_expired() => {
                inner.remove(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Snapshot of every stored entry, expired or not
    pub fn all_entries(&self) -> Vec<CacheEntry<V>> {
        self.inner
            .lock()
            .entries
            .values()
            .map(|stored| stored.entry.clone())
            .collect()
    }

    /// Drop every expired entry
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, stored)| stored.entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        let swept = expired.len();

        if swept > 0 {
            self.expirations.fetch_add(swept as u64, Ordering::Relaxed);
            debug!(swept = swept, "Swept expired entries");
        }
        swept
    }

    pub fn keys_matching(&self, pattern: Option<&str>) -> Vec<String> {
        self.inner
            .lock()
            .entries
            .keys()
            .filter(|key| pattern.map_or(true, |p| pattern_matches(p, key)))
            .cloned()
            .collect()
    }

    /// Up to `limit` live keys ordered by descending access count
    pub fn keys_by_access_count(&self, limit: usize) -> Vec<String> {
        let inner = self.inner.lock();
        let now = Instant::now();
        let mut ranked: Vec<(&String, u64, u64)> = inner
            .entries
            .iter()
            .filter(|(_, stored)| !stored.entry.is_expired_at(now))
            .map(|(key, stored)| (key, stored.entry.access_count, stored.recency))
            .collect();

        // Most accessed first, most recently used breaks ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(key, _, _)| key.clone())
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.size(),
            capacity: self.max_entries,
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    fn ensure_connected(&self) -> CacheResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CacheError::NotConnected)
        }
    }
}

impl<V> StorageAdapter<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn connect(&self) -> CacheResult<()> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn disconnect(&self) -> CacheResult<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    async fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> CacheResult<()> {
        self.ensure_connected()?;
        MemoryStore::set(self, key, value, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<V>> {
        self.ensure_connected()?;
        Ok(MemoryStore::get(self, key))
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        self.ensure_connected()?;
        Ok(MemoryStore::has(self, key))
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.ensure_connected()?;
        Ok(MemoryStore::delete(self, key))
    }

    async fn clear(&self) -> CacheResult<()> {
        self.ensure_connected()?;
        MemoryStore::clear(self);
        Ok(())
    }

    async fn size(&self) -> CacheResult<usize> {
        self.ensure_connected()?;
        Ok(MemoryStore::size(self))
    }

    async fn keys(&self, pattern: Option<&str>) -> CacheResult<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.keys_matching(pattern))
    }

    async fn ping(&self) -> CacheResult<bool> {
        Ok(self.connected.load(Ordering::Acquire))
    }

    async fn sweep_expired(&self) -> CacheResult<usize> {
        self.ensure_connected()?;
        Ok(MemoryStore::sweep_expired(self))
    }

    async fn ranked_keys(&self, limit: usize) -> CacheResult<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.keys_by_access_count(limit))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
