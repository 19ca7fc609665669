//! Cache Module
//!
//! Provides a generic in-memory cache with per-entry TTL expiration.

mod entry;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::Cache;

// == Public Constants ==
/// Longest lifetime an entry can be given; longer TTLs are capped
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);
