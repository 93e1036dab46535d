//! Cache Entry Module
//!
//! Defines a single key-value pair and its links within the recency list.

/// Index of an entry slot in the recency list arena.
pub type Handle = usize;

// == Cache Entry ==
/// One cached key-value pair plus its position in the recency order.
///
/// Links are handles into the owning arena, not references; the list owns
/// every entry.
#[derive(Debug)]
pub struct CacheEntry<V> {
    key: String,
    /// The stored value, replaced in place on overwrite
    pub value: V,
    /// Neighbour towards the head (more recently used)
    pub(crate) prev: Option<Handle>,
    /// Neighbour towards the tail (less recently used)
    pub(crate) next: Option<Handle>,
    /// Whether the entry is currently reachable from the list head
    pub(crate) linked: bool,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a detached entry.
    pub fn new(key: String, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
            linked: false,
        }
    }

    /// The key this entry was created for.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Consumes the entry, returning its key.
    pub fn into_key(self) -> String {
        self.key
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }
}
