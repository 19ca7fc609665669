//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with an absolute expiration.

use std::time::{Duration, Instant};

use crate::cache::MAX_TTL;

// == Cache Entry ==
/// Represents a single cache entry with its value and expiration instant.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant at which the entry stops being live
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry that expires `ttl` from now.
    ///
    /// A zero TTL produces an entry that is already expired. TTLs above
    /// [`MAX_TTL`] are capped.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl.min(MAX_TTL),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to its expiration instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiration against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
