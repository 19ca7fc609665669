//! Configuration Module
//!
//! Handles cache options, their defaults, and loading them from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::MAX_TTL;
use crate::error::{CacheError, Result};

/// Default lifetime of an entry stored with `Cache::set`
pub const DEFAULT_ITEM_TTL: Duration = Duration::from_secs(2 * 60);

/// Default period between background sweeps
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(30);

/// Environment variable holding the default item TTL in milliseconds
pub const ITEM_TTL_ENV: &str = "CACHE_ITEM_TTL_MS";

/// Environment variable holding the sweep interval in milliseconds
pub const GC_INTERVAL_ENV: &str = "CACHE_GC_INTERVAL_MS";

/// Cache configuration parameters.
///
/// Zero values are not "no expiry" or "no sweeping": `validate` backfills
/// them with [`DEFAULT_ITEM_TTL`] and [`DEFAULT_GC_INTERVAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// TTL applied by `Cache::set`
    pub item_ttl: Duration,
    /// Period between background sweeps of expired entries
    pub gc_interval: Duration,
}

impl CacheOptions {
    /// Creates options with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default item TTL.
    pub fn with_item_ttl(mut self, item_ttl: Duration) -> Self {
        self.item_ttl = item_ttl;
        self
    }

    /// Sets the sweep interval.
    pub fn with_gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }

    /// Creates options by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ITEM_TTL_MS` - Default TTL in milliseconds (default: 120000)
    /// - `CACHE_GC_INTERVAL_MS` - Sweep interval in milliseconds (default: 30000)
    ///
    /// Unset variables fall back to the defaults. Negative or non-numeric
    /// values are rejected with `CacheError::InvalidConfig`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let options = Self {
            item_ttl: parse_millis(ITEM_TTL_ENV, lookup(ITEM_TTL_ENV))?,
            gc_interval: parse_millis(GC_INTERVAL_ENV, lookup(GC_INTERVAL_ENV))?,
        };
        options.validate()
    }

    // == Validate ==
    /// Sanity checks the values and backfills zero values with defaults.
    ///
    /// # Errors
    /// `CacheError::InvalidConfig` if either duration exceeds [`MAX_TTL`].
    pub fn validate(self) -> Result<Self> {
        if self.item_ttl > MAX_TTL {
            return Err(CacheError::InvalidConfig(format!(
                "item TTL must not exceed {:?}: {:?}",
                MAX_TTL, self.item_ttl
            )));
        }
        if self.gc_interval > MAX_TTL {
            return Err(CacheError::InvalidConfig(format!(
                "GC interval must not exceed {:?}: {:?}",
                MAX_TTL, self.gc_interval
            )));
        }

        Ok(self.backfill_defaults())
    }

    fn backfill_defaults(mut self) -> Self {
        if self.item_ttl.is_zero() {
            self.item_ttl = DEFAULT_ITEM_TTL;
        }
        if self.gc_interval.is_zero() {
            self.gc_interval = DEFAULT_GC_INTERVAL;
        }
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            item_ttl: DEFAULT_ITEM_TTL,
            gc_interval: DEFAULT_GC_INTERVAL,
        }
    }
}

/// Parses a signed millisecond count; an unset variable counts as zero.
fn parse_millis(name: &str, raw: Option<String>) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::ZERO);
    };

    let millis: i64 = raw.trim().parse().map_err(|_| {
        CacheError::InvalidConfig(format!("{} must be an integer: {:?}", name, raw))
    })?;

    if millis < 0 {
        return Err(CacheError::InvalidConfig(format!(
            "{} must not be negative: {}",
            name, millis
        )));
    }

    Ok(Duration::from_millis(millis.unsigned_abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_options_default() {
        let options = CacheOptions::default();
        assert_eq!(options.item_ttl, Duration::from_secs(120));
        assert_eq!(options.gc_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_keeps_valid_values() {
        let options = CacheOptions::new()
            .with_item_ttl(Duration::from_secs(5))
            .with_gc_interval(Duration::from_millis(250))
            .validate()
            .unwrap();

        assert_eq!(options.item_ttl, Duration::from_secs(5));
        assert_eq!(options.gc_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_validate_backfills_zero_values() {
        let options = CacheOptions::new()
            .with_item_ttl(Duration::ZERO)
            .with_gc_interval(Duration::ZERO)
            .validate()
            .unwrap();

        assert_eq!(options.item_ttl, DEFAULT_ITEM_TTL);
        assert_eq!(options.gc_interval, DEFAULT_GC_INTERVAL);
    }

    #[test]
    fn test_validate_rejects_oversized_values() {
        let too_long = MAX_TTL + Duration::from_secs(1);

        let result = CacheOptions::new().with_item_ttl(too_long).validate();
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));

        let result = CacheOptions::new().with_gc_interval(too_long).validate();
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_lookup_defaults_when_unset() {
        let options = CacheOptions::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(options, CacheOptions::default());
    }

    #[test]
    fn test_from_lookup_reads_millis() {
        let lookup = lookup_from(&[(ITEM_TTL_ENV, "1500"), (GC_INTERVAL_ENV, " 200 ")]);
        let options = CacheOptions::from_lookup(lookup).unwrap();

        assert_eq!(options.item_ttl, Duration::from_millis(1500));
        assert_eq!(options.gc_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_from_lookup_rejects_negative_item_ttl() {
        let lookup = lookup_from(&[(ITEM_TTL_ENV, "-1000"), (GC_INTERVAL_ENV, "10000")]);
        let result = CacheOptions::from_lookup(lookup);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_lookup_rejects_negative_gc_interval() {
        let lookup = lookup_from(&[(ITEM_TTL_ENV, "10000"), (GC_INTERVAL_ENV, "-5000")]);
        let result = CacheOptions::from_lookup(lookup);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let lookup = lookup_from(&[(ITEM_TTL_ENV, "two minutes")]);
        let result = CacheOptions::from_lookup(lookup);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }
}
