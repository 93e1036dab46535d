//! Cache Selection Module
//!
//! The policy-independent cache interface and the factory choosing an
//! implementation by kind.

use std::fmt;
use std::str::FromStr;

use crate::cache::LruCache;
use crate::config::{Config, Modifier};
use crate::error::{CacheError, Result};

// == Cache Trait ==
/// Operations every eviction policy provides.
pub trait Cache<V>: Send + Sync {
    /// Returns the value for `key`, if present.
    fn get(&self, key: &str) -> Option<V>;

    /// Stores `value` under `key`.
    fn set(&self, key: String, value: V);

    /// Halts background maintenance. Idempotent.
    fn stop(&self);
}

// == Cache Kind ==
/// Available eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheKind {
    /// Least recently used
    #[default]
    Lru,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Lru => write!(f, "LRU"),
        }
    }
}

impl FromStr for CacheKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("lru") {
            Ok(CacheKind::Lru)
        } else {
            Err(CacheError::UnknownKind(s.to_string()))
        }
    }
}

// == Factory ==
/// Builds a cache of the given kind from the default config plus `modifiers`.
///
/// Must be called from within a Tokio runtime.
pub fn try_new_cache<V, I>(kind: CacheKind, modifiers: I) -> Result<Box<dyn Cache<V>>>
where
    V: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Modifier>,
{
    let config = Config::default().apply(modifiers);
    let cache: Box<dyn Cache<V>> = match kind {
        CacheKind::Lru => Box::new(LruCache::with_config(config)?),
    };
    Ok(cache)
}

/// Like [`try_new_cache`], but treats a bad configuration as a programming
/// error.
///
/// # Panics
/// Panics if the resulting config is invalid or no Tokio runtime is running.
pub fn new_cache<V, I>(kind: CacheKind, modifiers: I) -> Box<dyn Cache<V>>
where
    V: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Modifier>,
{
    match try_new_cache(kind, modifiers) {
        Ok(cache) => cache,
        Err(err) => panic!("failed to build {} cache: {}", kind, err),
    }
}
