//! Timed Cache - A generic in-process cache with TTL expiration
//!
//! Entries expire at an absolute instant and are purged either lazily when
//! read or eagerly by a background collector running on Tokio.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats};
pub use config::CacheOptions;
pub use error::{CacheError, Result};
pub use tasks::Collector;
