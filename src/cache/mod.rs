//! # Entry Store
//!
//! Cached values with TTL and bounded capacity, plus the [`StorageAdapter`]
//! seam that lets an external backend stand in for the built-in store.
//!
//! ## Architecture
//!
//! - **`CacheEntry`**: value plus access bookkeeping (count, last access, TTL)
//! - **`MemoryStore`**: in-process map with true LRU eviction and lazy expiry
//! - **`StorageAdapter`**: async capability set every backend must provide
//!
//! ## Usage
//!
//! ```rust
//! use self_healing_cache::cache::MemoryStore;
//! use std::time::Duration;
//!
//! let store = MemoryStore::new(2, Some(Duration::from_secs(60)));
//! store.set("a", 1, None);
//! store.set("b", 2, None);
//! store.get("a");
//! store.set("c", 3, None); // evicts "b", the least recently accessed
//!
//! assert!(store.has("a"));
//! assert!(!store.has("b"));
//! ```

pub mod entry;
pub mod store;
pub mod traits;

pub use entry::{CacheEntry, EntrySummary};
pub use store::{MemoryStore, StoreStats};
pub use traits::{pattern_matches, StorageAdapter};
