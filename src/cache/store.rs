//! Cache Store Module
//!
//! Main cache engine combining HashMap storage, per-entry expiration and the
//! background collector that sweeps expired entries.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::info;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats};
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};
use crate::tasks::Collector;

type EntryMap<K, V> = HashMap<K, CacheEntry<V>>;

// == Cache ==
/// Thread-safe in-memory cache with per-entry TTL.
///
/// Expiration is enforced two ways: reads check the entry's expiration and
/// remove it when stale, and a background [`Collector`] periodically sweeps
/// every expired entry.
///
/// The collector starts on construction and runs until [`Cache::close`].
/// Always close a cache once you are done with it.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use timed_cache::{Cache, CacheOptions};
///
/// #[tokio::main]
/// async fn main() -> timed_cache::Result<()> {
///     let cache = Cache::new(CacheOptions::new().with_item_ttl(Duration::from_secs(60)))?;
///     cache.set("answer".to_string(), 42).await;
///     assert_eq!(cache.get("answer").await?, 42);
///     cache.close().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Cache<K, V> {
    /// Key-value storage
    entries: Arc<RwLock<EntryMap<K, V>>>,
    /// Counters shared with the sweep routine
    stats: Arc<StatsRecorder>,
    /// TTL applied by `set`
    default_ttl: Duration,
    /// Background sweeper owned by this cache
    collector: Collector,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its background collector.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// - `CacheError::InvalidConfig` if the options fail validation
    /// - `CacheError::Runtime` if no Tokio runtime is available
    pub fn new(options: CacheOptions) -> Result<Self> {
        let options = options.validate()?;

        let entries: Arc<RwLock<EntryMap<K, V>>> = Arc::new(RwLock::new(HashMap::new()));
        let stats = Arc::new(StatsRecorder::default());

        let collector = {
            let entries = Arc::clone(&entries);
            let stats = Arc::clone(&stats);
            Collector::new(options.gc_interval, move || {
                let entries = Arc::clone(&entries);
                let stats = Arc::clone(&stats);
                async move {
                    let removed = sweep(&entries).await;
                    stats.record_swept(removed);
                    Ok::<_, anyhow::Error>(removed)
                }
            })?
        };
        collector.start()?;

        info!(
            "Cache initialized: item_ttl={:?}, gc_interval={:?}",
            options.item_ttl, options.gc_interval
        );

        Ok(Self {
            entries,
            stats,
            default_ttl: options.item_ttl,
            collector,
        })
    }

    // == Set ==
    /// Stores a value with the default TTL.
    ///
    /// If the key already exists, the previous entry is replaced and its TTL reset.
    pub async fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Stores a value with a custom TTL.
    ///
    /// A zero TTL stores an entry that is already expired.
    pub async fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl);
        self.entries.write().await.insert(key, entry);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// An expired entry is removed as a side effect of the read.
    ///
    /// # Errors
    /// - `CacheError::NotFound` if the key is absent
    /// - `CacheError::Expired` if the entry's TTL has elapsed
    pub async fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => {
                    self.stats.record_miss();
                    return Err(CacheError::NotFound);
                }
                Some(entry) if !entry.is_expired_at(now) => {
                    self.stats.record_hit();
                    return Ok(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a racing writer may already have
        // removed the entry or replaced it with a fresh one.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
            entries.remove(key);
        }
        self.stats.record_expiration();
        Err(CacheError::Expired)
    }

    // == Delete ==
    /// Removes an entry by key. Absent keys are ignored.
    pub async fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.write().await.remove(key);
    }

    // == Clear ==
    /// Discards all entries.
    pub async fn clear(&self) {
        *self.entries.write().await = HashMap::new();
    }

    // == Keys ==
    /// Returns the keys of all live entries, in no particular order.
    ///
    /// Expired entries are skipped but not removed.
    pub async fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let now = Instant::now();
        let entries = self.entries.read().await;

        entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Contains Key ==
    /// Returns true if `get` on this key would currently succeed.
    ///
    /// Like `get`, this removes the entry if it has expired.
    pub async fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).await.is_ok()
    }

    // == Time To Live ==
    /// Returns the remaining lifetime of a live entry without touching it.
    ///
    /// # Errors
    /// - `CacheError::NotFound` if the key is absent
    /// - `CacheError::Expired` if the entry's TTL has elapsed
    pub async fn ttl<Q>(&self, key: &Q) -> Result<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Err(CacheError::NotFound),
            Some(entry) if entry.is_expired() => Err(CacheError::Expired),
            Some(entry) => Ok(entry.ttl_remaining()),
        }
    }

    // == Size ==
    /// Returns the number of stored entries.
    ///
    /// Expired entries count until a read, a delete or a sweep removes them,
    /// so this can be larger than `keys().len()`.
    pub async fn size(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Purge Expired ==
    /// Runs a sweep now instead of waiting for the collector.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let removed = sweep(&self.entries).await;
        self.stats.record_swept(removed);
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.size().await;
        self.stats.snapshot(total_entries)
    }

    /// Returns true while the background collector is running.
    pub fn is_collecting(&self) -> bool {
        self.collector.is_running()
    }

    // == Close ==
    /// Stops the background collector and waits for it to exit.
    ///
    /// Safe to call more than once. The cache stays usable afterwards, but
    /// expired entries are only removed by reads, deletes and
    /// `purge_expired`.
    pub async fn close(&self) {
        self.collector.stop().await;
        info!("Cache closed");
    }
}

/// Removes every entry expired as of now. Returns the number removed.
async fn sweep<K, V>(entries: &RwLock<EntryMap<K, V>>) -> usize
where
    K: Eq + Hash,
{
    let now = Instant::now();
    let mut entries = entries.write().await;

    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired_at(now));
    before - entries.len()
}
