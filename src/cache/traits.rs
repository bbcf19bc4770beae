//! Storage adapter trait definition

use crate::error::CacheResult;
use std::future::Future;
use std::time::Duration;

/// Trait defining the storage backend operations the engine relies on
///
/// Implemented by the built-in [`super::MemoryStore`]; external backends
/// (Redis, SQL) must preserve the same TTL and existence semantics: an expired
/// entry is indistinguishable from an absent one.
pub trait StorageAdapter<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Establish the backend connection
    fn connect(&self) -> impl Future<Output = CacheResult<()>> + Send;

    /// Tear down the backend connection
    fn disconnect(&self) -> impl Future<Output = CacheResult<()>> + Send;

    /// Store a value; `None` TTL means the backend's default
    fn set(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Get a value by key
    ///
    /// Returns `Ok(Some(value))` on hit, `Ok(None)` on miss or expiry.
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<V>>> + Send;

    /// Check for a live (non-expired) entry
    fn has(&self, key: &str) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Delete a key, returning whether it existed
    fn delete(&self, key: &str) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Remove every entry
    fn clear(&self) -> impl Future<Output = CacheResult<()>> + Send;

    /// Number of stored entries
    fn size(&self) -> impl Future<Output = CacheResult<usize>> + Send;

    /// Keys matching an optional glob pattern (`*` matches any run of characters)
    fn keys(&self, pattern: Option<&str>) -> impl Future<Output = CacheResult<Vec<String>>> + Send;

    /// Check if the backend is reachable
    fn ping(&self) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Remove expired entries, returning how many were dropped
    ///
    /// Backends that expire entries on their own keep the default, which
    /// reports nothing swept.
    fn sweep_expired(&self) -> impl Future<Output = CacheResult<usize>> + Send {
        async { Ok(0) }
    }

    /// Up to `limit` keys, most valuable to keep warm first
    ///
    /// The default has no access statistics and returns keys in backend order.
    fn ranked_keys(&self, limit: usize) -> impl Future<Output = CacheResult<Vec<String>>> + Send {
        async move {
            let mut keys = self.keys(None).await?;
            keys.truncate(limit);
            Ok(keys)
        }
    }

    /// Name of the storage provider
    fn provider_name(&self) -> &'static str;
}

/// Glob match supporting `*` wildcards
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if !pattern.contains('*') {
        return pattern == key;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut remaining = key;

    // First part anchors at the start, last part at the end
    let first = parts[0];
    if !remaining.starts_with(first) {
        return false;
    }
    remaining = &remaining[first.len()..];

    let last = parts[parts.len() - 1];
    for part in &parts[1..parts.len() - 1] {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }

    remaining.len() >= last.len() && remaining.ends_with(last)
}
