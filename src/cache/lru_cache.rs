//! LRU Cache Facade
//!
//! Public handle combining the guarded store with its mutation pipeline.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle as RuntimeHandle;
use tracing::{debug, trace};

use crate::cache::{Cache, CacheStore, Upsert};
use crate::config::{Config, Modifier};
use crate::error::{CacheError, Result};
use crate::tasks::Pipeline;

// == LRU Cache ==
/// Bounded, thread-safe LRU cache.
///
/// `get` and `set` only touch the lookup table on the caller's thread;
/// linking, eviction and reordering happen on three background Tokio tasks.
/// Eviction is eventually consistent: the cache may briefly hold more than
/// `capacity` entries after a `set` returns. Call [`quiesce`](Self::quiesce)
/// to wait for the pipeline to settle.
///
/// After [`stop`](Self::stop) the cache degrades to an unordered map: `get`
/// and `set` still work against the table, but ordering and eviction no
/// longer progress. Dropping the cache stops its workers.
pub struct LruCache<V> {
    store: Arc<RwLock<CacheStore<V>>>,
    pipeline: Pipeline,
    capacity: usize,
}

impl<V> LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache with the default configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Creates a cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(Config {
            capacity,
            ..Config::default()
        })
    }

    /// Creates a cache from the default configuration after applying
    /// `modifiers` in order.
    pub fn with_modifiers<I>(modifiers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Modifier>,
    {
        Self::with_config(Config::default().apply(modifiers))
    }

    /// Creates a cache on the current Tokio runtime.
    pub fn with_config(config: Config) -> Result<Self> {
        let runtime = RuntimeHandle::try_current()
            .map_err(|err| CacheError::RuntimeUnavailable(err.to_string()))?;
        Self::with_config_on(&runtime, config)
    }

    /// Creates a cache whose workers run on `runtime`.
    ///
    /// Unlike the other constructors this one may be called from any thread.
    pub fn with_config_on(runtime: &RuntimeHandle, config: Config) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(RwLock::new(CacheStore::new()));
        let pipeline = Pipeline::spawn(
            runtime,
            Arc::clone(&store),
            config.capacity,
            config.access_buffer,
        );
        debug!("LRU cache created with capacity {}", config.capacity);

        Ok(Self {
            store,
            pipeline,
            capacity: config.capacity,
        })
    }

    // == Set ==
    /// Stores a value.
    ///
    /// Replacing an existing key updates the value and promotes it to most
    /// recently used immediately; it still counts as one entry. A new key is
    /// visible to `get` as soon as this returns and is linked by the inserter
    /// shortly after. Never waits for eviction.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let outcome = self.store.write().upsert(key.clone(), value);

        let queued = match outcome {
            Upsert::Created(handle) => self.pipeline.submit_insert(handle),
            Upsert::Pending => self.pipeline.submit_relink(key.clone()),
            Upsert::Replaced => true,
        };
        if !queued {
            trace!("Pipeline stopped, key {} stays unordered", key);
        }
    }

    // == Get ==
    /// Returns a clone of the value stored for `key`.
    ///
    /// A hit queues a best-effort promotion with the repositioner; it is
    /// dropped if the pipeline is saturated or stopped. While the inserter
    /// still has queued work (including the link of this very entry) the
    /// promotion is handed to the inserter instead, so it lands after every
    /// write issued before this read.
    pub fn get(&self, key: &str) -> Option<V> {
        let (value, linked) = {
            let store = self.store.read();
            let (value, linked) = store.lookup_linked(key)?;
            (value.clone(), linked)
        };

        if linked && self.pipeline.inserts_settled() {
            self.pipeline.signal_access(key.to_string());
        } else if !self.pipeline.submit_relink(key.to_string()) {
            trace!("Pipeline stopped, read of {} not reordered", key);
        }
        Some(value)
    }

    // == Stop ==
    /// Halts the background workers. Idempotent; does not wait for them.
    pub fn stop(&self) {
        self.pipeline.stop();
    }

    /// Stops the workers and waits for them to exit.
    pub async fn shutdown(&self) {
        self.pipeline.shutdown().await;
    }

    /// Waits until every signal issued before this call has been applied.
    ///
    /// Returns immediately once the cache is stopped.
    pub async fn quiesce(&self) {
        self.pipeline.quiesce().await;
    }

    // == Introspection ==
    pub fn is_stopped(&self) -> bool {
        self.pipeline.is_stopped()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of keys in the lookup table, including entries not linked yet.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Linked keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.store.read().keys()
    }
}

impl<V> Cache<V> for LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<V> {
        LruCache::get(self, key)
    }

    fn set(&self, key: String, value: V) {
        LruCache::set(self, key, value)
    }

    fn stop(&self) {
        LruCache::stop(self)
    }
}
