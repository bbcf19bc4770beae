//! # Orchestration
//!
//! Ties the store, health monitor, failure predictor and recovery manager
//! together behind [`SelfHealingCache`].
//!
//! ## Request path
//!
//! A `get` that misses calls the configured refresh function up to
//! `max_refresh_attempts` times with exponential backoff, stores the value
//! and returns it. Every `ml_sampling_interval`th request runs a sampling
//! step: earlier predictions whose resolution delay has passed are scored
//! against the current state, and a fresh prediction is made and trained on.
//!
//! ## Health check
//!
//! `start` spawns a periodic task that snapshots metrics, sweeps expired
//! entries and, when the cache is not healthy and adaptive recovery is on,
//! runs one self-healing pass:
//!
//! 1. Predict failure from the current metrics and trends
//! 2. Use the recommended strategy if prediction and confidence clear the
//!    threshold, otherwise the configured default
//! 3. Refresh the most-accessed keys through the recovery manager
//! 4. Backfill the post-recovery metrics and train on the outcome
//!
//! Passes never overlap; a trigger while one is running is a no-op.
//!
//! ## Example
//!
//! ```rust
//! use self_healing_cache::SelfHealingCache;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let cache = SelfHealingCache::<String>::builder()
//!     .with_max_entries(1_000)
//!     .with_health_check_interval(Duration::from_secs(5))
//!     .with_refresh_function(|key: String| async move {
//!         Ok(Some(format!("fresh value for {key}")))
//!     })
//!     .build()
//!     .unwrap();
//!
//! cache.start();
//! let value = cache.get("user:42").await.unwrap();
//! assert_eq!(value.as_deref(), Some("fresh value for user:42"));
//! cache.stop().await;
//! # });
//! ```

pub mod backoff;
pub mod builder;
pub mod core;
mod health_check;
pub mod types;

pub use backoff::BackoffCalculator;
pub use builder::SelfHealingCacheBuilder;
pub use self::core::SelfHealingCache;
pub use types::{into_refresh_fn, CacheStats, RefreshFn};
