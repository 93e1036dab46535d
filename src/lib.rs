//! LRU Pipeline - A concurrent in-process LRU cache
//!
//! Lookups and inserts run on the caller's thread; linking, eviction and
//! recency reordering run on background Tokio tasks.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{new_cache, try_new_cache, Cache, CacheKind, LruCache};
pub use config::{with_access_buffer, with_capacity, Config, Modifier};
pub use error::{CacheError, Result};
