//! Timed Cache demo
//!
//! Stores a struct value, reads it back, shows lazy expiry, and closes the cache.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timed_cache::{Cache, CacheError, CacheOptions};

#[derive(Debug, Clone)]
struct SampleData {
    foo: String,
    bar: i32,
}

/// Entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load cache options from environment variables
/// 3. Create the cache, which starts its background collector
/// 4. Exercise set/get and a short-lived entry
/// 5. Close the cache, waiting for the collector to exit
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timed_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = CacheOptions::from_env().context("loading cache options")?;
    let cache: Cache<String, SampleData> = Cache::new(options).context("creating cache")?;

    cache
        .set(
            "someUUID".to_string(),
            SampleData {
                foo: "bar".to_string(),
                bar: 1,
            },
        )
        .await;

    match cache.get("someUUID").await {
        Ok(data) => info!("Read back: foo={} bar={}", data.foo, data.bar),
        Err(err) => warn!("Lookup failed: {}", err),
    }

    cache
        .set_with_ttl(
            "shortLived".to_string(),
            SampleData {
                foo: "baz".to_string(),
                bar: 2,
            },
            Duration::from_millis(50),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    if let Err(CacheError::Expired) = cache.get("shortLived").await {
        info!("shortLived expired and was removed on read");
    }

    info!("Stats: {:?}", cache.stats().await);

    cache.close().await;
    Ok(())
}
