//! # Error Types
//!
//! Crate-wide error handling for the cache engine. The request path surfaces
//! `UpstreamFailure` and storage errors to application code; everything raised
//! inside the self-healing path is caught, logged and recorded in the recovery
//! history.

use crate::config::ConfigurationError;
use crate::resilience::RecoveryStrategy;
use thiserror::Error;
use uuid::Uuid;

/// Error type returned by user refresh callbacks and key refreshers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// The refresh callback kept failing until the attempt budget ran out
    #[error("Upstream refresh for key '{key}' failed after {attempts} attempt(s): {source}")]
    UpstreamFailure {
        key: String,
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// A strategy name did not match any known recovery strategy
    #[error("Unknown recovery strategy: {0}")]
    UnknownStrategy(String),

    /// A recovery strategy failed (logged into the recovery history)
    #[error("Recovery {strategy} failed (action {action_id}): {reason}")]
    RecoveryFailed {
        action_id: Uuid,
        strategy: RecoveryStrategy,
        reason: String,
    },

    /// Backend failure reported by a [`crate::StorageAdapter`] implementation
    ///
    /// The built-in store never fails; external adapters (Redis, SQL) map
    /// their client errors to this variant.
    #[error("Storage backend error: {0}")]
    Storage(String),

    /// Storage adapter used before `connect()` or after `disconnect()`
    #[error("Storage backend is not connected")]
    NotConnected,

    /// Invalid configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl CacheError {
    /// Whether this error came from the user-supplied data source
    pub fn is_upstream(&self) -> bool {
        matches!(self, CacheError::UpstreamFailure { .. })
    }
}

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;
