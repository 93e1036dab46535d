//! LRU Pipeline demo
//!
//! Builds a cache from the environment, drives it from several concurrent
//! tasks and reports what survived eviction.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_pipeline::{Config, LruCache};

/// Number of concurrent writer tasks
const WRITERS: usize = 4;
/// Operations issued by each writer
const OPS_PER_WRITER: usize = 1000;
/// Distinct keys shared by all writers
const KEY_SPACE: usize = 64;

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and its background workers
/// 4. Run writers issuing interleaved set/get calls
/// 5. Quiesce, report, and shut the workers down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, access_buffer={}",
        config.capacity, config.access_buffer
    );

    let cache = Arc::new(LruCache::with_config(config).context("failed to build cache")?);

    let mut writers = Vec::with_capacity(WRITERS);
    for writer in 0..WRITERS {
        let cache = Arc::clone(&cache);
        writers.push(tokio::spawn(async move {
            let mut hits = 0usize;
            for op in 0..OPS_PER_WRITER {
                let key = format!("key-{}", (writer * 17 + op * 5) % KEY_SPACE);
                if op % 2 == 0 {
                    cache.set(key, op);
                } else if cache.get(&key).is_some() {
                    hits += 1;
                }
            }
            hits
        }));
    }

    let mut hits = 0;
    for writer in writers {
        hits += writer.await.context("writer task panicked")?;
    }

    cache.quiesce().await;
    info!(
        "Workload finished: {} hits over {} reads, {} entries retained",
        hits,
        WRITERS * OPS_PER_WRITER / 2,
        cache.len()
    );
    info!("Most to least recently used: {:?}", cache.keys());

    cache.shutdown().await;
    info!("Cache workers stopped");

    Ok(())
}
