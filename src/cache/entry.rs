//! Cache entry type

use serde::Serialize;
use std::time::{Duration, Instant};

/// A cached value with its access bookkeeping
///
/// Owned exclusively by the store: created on `set`, touched on every
/// successful `get`, dropped on eviction, expiry or delete.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: Instant,
    pub access_count: u64,
    pub last_access_at: Instant,
    pub ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    pub fn new(key: String, value: V, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            key,
            value,
            created_at: now,
            access_count: 0,
            last_access_at: now,
            ttl,
        }
    }

    /// Expired once strictly more than `ttl` has passed since creation
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at) > ttl,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Record a successful read
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_access_at = Instant::now();
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Serializable view without the value
    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            key: self.key.clone(),
            access_count: self.access_count,
            age_ms: self.age().as_millis() as u64,
            idle_ms: self.last_access_at.elapsed().as_millis() as u64,
            ttl_ms: self.ttl.map(|ttl| ttl.as_millis() as u64),
        }
    }
}

/// Entry metadata for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub key: String,
    pub access_count: u64,
    pub age_ms: u64,
    pub idle_ms: u64,
    pub ttl_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = CacheEntry::new("k".to_string(), 1, None);
        assert!(!entry.is_expired_at(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn test_entry_expires_strictly_after_ttl() {
        let entry = CacheEntry::new("k".to_string(), 1, Some(Duration::from_millis(100)));
        assert!(!entry.is_expired_at(entry.created_at + Duration::from_millis(100)));
        assert!(entry.is_expired_at(entry.created_at + Duration::from_millis(101)));
    }

    #[test]
    fn test_touch_updates_access_bookkeeping() {
        let mut entry = CacheEntry::new("k".to_string(), "v", None);
        let before = entry.last_access_at;
        entry.touch();
        entry.touch();
        assert_eq!(entry.access_count, 2);
        assert!(entry.last_access_at >= before);
        assert_eq!(entry.summary().access_count, 2);
    }
}
