//! Cache Module
//!
//! Provides the bounded LRU cache, its recency list and lookup table.

mod entry;
mod kind;
mod lru;
mod lru_cache;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, Handle};
pub use kind::{new_cache, try_new_cache, Cache, CacheKind};
pub use lru::{Iter, RecencyList};
pub use lru_cache::LruCache;
pub use store::{CacheStore, Upsert};
