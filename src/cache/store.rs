//! Cache Store Module
//!
//! Lookup table and recency list kept together as the single unit guarded by
//! the cache lock.

use std::collections::HashMap;

use crate::cache::{Handle, RecencyList};

/// Outcome of [`CacheStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new detached entry was created and must be linked by the inserter
    Created(Handle),
    /// An existing linked entry had its value replaced and was promoted
    Replaced,
    /// The value of an entry still waiting for the inserter was replaced
    Pending,
}

// == Cache Store ==
/// Lookup table plus recency list.
///
/// The table may briefly hold entries the inserter has not linked yet; once
/// the pipeline quiesces every table entry is linked and vice versa.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key to entry handle
    table: HashMap<String, Handle>,
    /// Recency order and entry storage
    list: RecencyList<V>,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            list: RecencyList::new(),
        }
    }

    // == Lookup ==
    /// Returns the value stored for a key, linked or not.
    pub fn lookup(&self, key: &str) -> Option<&V> {
        self.lookup_linked(key).map(|(value, _)| value)
    }

    /// Returns the value stored for a key and whether its entry is linked.
    pub fn lookup_linked(&self, key: &str) -> Option<(&V, bool)> {
        let handle = *self.table.get(key)?;
        self.list
            .get(handle)
            .map(|entry| (&entry.value, entry.is_linked()))
    }

    // == Upsert ==
    /// Stores a value.
    ///
    /// An existing key has its value replaced and is moved to the head if it
    /// is already linked. A new key gets a detached entry in the table; the
    /// caller hands the returned handle to the inserter.
    pub fn upsert(&mut self, key: String, value: V) -> Upsert {
        if let Some(&handle) = self.table.get(&key) {
            if let Some(entry) = self.list.get_mut(handle) {
                entry.value = value;
                if !entry.linked {
                    return Upsert::Pending;
                }
                self.list.move_to_head(handle);
                return Upsert::Replaced;
            }
        }

        let handle = self.list.alloc(key.clone(), value);
        self.table.insert(key, handle);
        Upsert::Created(handle)
    }

    // == Link ==
    /// Links a pending entry at the head. Returns false if it was not pending.
    pub fn link(&mut self, handle: Handle) -> bool {
        self.list.link_at_head(handle)
    }

    // == Evict Tail ==
    /// Removes the least recently used entry from both list and table.
    ///
    /// Returns the evicted key, or None if the list is empty.
    pub fn evict_tail(&mut self) -> Option<String> {
        let handle = self.list.unlink_tail()?;
        let entry = self.list.release(handle)?;
        let key = entry.into_key();
        self.table.remove(&key);
        Some(key)
    }

    // == Promote ==
    /// Moves a key's entry to the head. Returns false if the key is absent
    /// or its entry is not linked yet.
    pub fn promote(&mut self, key: &str) -> bool {
        let Some(&handle) = self.table.get(key) else {
            return false;
        };
        if !self.list.get(handle).is_some_and(|entry| entry.is_linked()) {
            return false;
        }
        self.list.move_to_head(handle);
        true
    }

    // == Length ==
    /// Returns the number of keys in the lookup table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of entries linked into the recency list.
    pub fn linked_len(&self) -> usize {
        self.list.len()
    }

    /// Linked keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.list.iter().map(|entry| entry.key().to_string()).collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn linked(store: &mut CacheStore<&'static str>, key: &str, value: &'static str) {
        match store.upsert(key.to_string(), value) {
            Upsert::Created(handle) => assert!(store.link(handle)),
            Upsert::Replaced | Upsert::Pending => {}
        }
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore<u8> = CacheStore::new();
        assert!(store.is_empty());
        assert_eq!(store.linked_len(), 0);
    }

    #[test]
    fn test_upsert_creates_pending_entry() {
        let mut store = CacheStore::new();

        let outcome = store.upsert("key1".to_string(), "value1");

        assert!(matches!(outcome, Upsert::Created(_)));
        assert_eq!(store.lookup("key1"), Some(&"value1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.linked_len(), 0);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_link_pending_entry() {
        let mut store = CacheStore::new();
        let Upsert::Created(handle) = store.upsert("key1".to_string(), "value1") else {
            panic!("expected a new entry");
        };

        assert!(store.link(handle));
        assert!(!store.link(handle));
        assert_eq!(store.linked_len(), 1);
        assert_eq!(store.keys(), vec!["key1"]);
    }

    #[test]
    fn test_upsert_replaces_and_promotes() {
        let mut store = CacheStore::new();
        linked(&mut store, "a", "1");
        linked(&mut store, "b", "2");

        let outcome = store.upsert("a".to_string(), "3");

        assert_eq!(outcome, Upsert::Replaced);
        assert_eq!(store.lookup("a"), Some(&"3"));
        assert_eq!(store.keys(), vec!["a", "b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_upsert_pending_replaces_without_linking() {
        let mut store = CacheStore::new();
        let first = store.upsert("a".to_string(), "1");
        let second = store.upsert("a".to_string(), "2");

        assert!(matches!(first, Upsert::Created(_)));
        assert_eq!(second, Upsert::Pending);
        assert_eq!(store.lookup("a"), Some(&"2"));
        assert_eq!(store.linked_len(), 0);
    }

    #[test]
    fn test_lookup_linked_reports_state() {
        let mut store = CacheStore::new();
        let Upsert::Created(handle) = store.upsert("a".to_string(), "1") else {
            panic!("expected a new entry");
        };

        assert_eq!(store.lookup_linked("a"), Some((&"1", false)));
        store.link(handle);
        assert_eq!(store.lookup_linked("a"), Some((&"1", true)));
        assert_eq!(store.lookup_linked("missing"), None);
    }

    #[test]
    fn test_evict_tail_removes_from_table() {
        let mut store = CacheStore::new();
        linked(&mut store, "a", "1");
        linked(&mut store, "b", "2");

        assert_eq!(store.evict_tail(), Some("a".to_string()));
        assert!(store.lookup("a").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.linked_len(), 1);
    }

    #[test]
    fn test_evict_empty_is_noop() {
        let mut store: CacheStore<&'static str> = CacheStore::new();
        assert_eq!(store.evict_tail(), None);
    }

    #[test]
    fn test_evict_skips_pending_entries() {
        let mut store = CacheStore::new();
        store.upsert("pending".to_string(), "1");

        assert_eq!(store.evict_tail(), None);
        assert_eq!(store.lookup("pending"), Some(&"1"));
    }

    #[test]
    fn test_promote() {
        let mut store = CacheStore::new();
        linked(&mut store, "a", "1");
        linked(&mut store, "b", "2");
        linked(&mut store, "c", "3");

        assert!(store.promote("a"));
        assert_eq!(store.keys(), vec!["a", "c", "b"]);
        assert_eq!(store.evict_tail(), Some("b".to_string()));
    }

    #[test]
    fn test_promote_missing_or_pending() {
        let mut store = CacheStore::new();
        store.upsert("pending".to_string(), "1");

        assert!(!store.promote("missing"));
        assert!(!store.promote("pending"));
    }

    #[test]
    fn test_slot_reuse_after_eviction() {
        let mut store = CacheStore::new();
        linked(&mut store, "a", "1");
        linked(&mut store, "b", "2");
        store.evict_tail();

        linked(&mut store, "c", "3");

        assert!(store.lookup("a").is_none());
        assert_eq!(store.lookup("c"), Some(&"3"));
        assert_eq!(store.keys(), vec!["c", "b"]);
    }
}
