//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its collector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key was never cached or has already been removed
    #[error("no cached entry")]
    NotFound,

    /// Key was cached but its TTL has elapsed
    #[error("entry has expired")]
    Expired,

    /// Configuration rejected at construction time
    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    /// No Tokio runtime is available to host the collector
    #[error("runtime unavailable: {0}")]
    Runtime(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
