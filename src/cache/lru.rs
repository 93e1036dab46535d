//! Recency List Module
//!
//! Arena-backed doubly linked list ordering entries from most recently used
//! (head) to least recently used (tail).

use super::entry::{CacheEntry, Handle};

// == Recency List ==
/// Tracks access order for LRU eviction.
///
/// Entries live in a flat arena addressed by [`Handle`]. Freed slots are
/// recycled through a free list. The list has no locking of its own; every
/// method assumes the caller holds exclusive access.
#[derive(Debug)]
pub struct RecencyList<V> {
    slots: Vec<Option<CacheEntry<V>>>,
    free: Vec<Handle>,
    head: Option<Handle>,
    tail: Option<Handle>,
    /// Number of linked entries
    len: usize,
}

impl<V> Default for RecencyList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RecencyList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Arena ==
    /// Stores a detached entry and returns its handle.
    pub fn alloc(&mut self, key: String, value: V) -> Handle {
        let entry = CacheEntry::new(key, value);
        match self.free.pop() {
            Some(handle) => {
                self.slots[handle] = Some(entry);
                handle
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    /// Frees a detached entry's slot and returns the entry.
    ///
    /// Returns None if the slot is empty or the entry is still linked.
    pub fn release(&mut self, handle: Handle) -> Option<CacheEntry<V>> {
        if self.get(handle)?.linked {
            return None;
        }
        let entry = self.slots[handle].take()?;
        self.free.push(handle);
        Some(entry)
    }

    pub fn get(&self, handle: Handle) -> Option<&CacheEntry<V>> {
        self.slots.get(handle).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut CacheEntry<V>> {
        self.slots.get_mut(handle).and_then(Option::as_mut)
    }

    // == Link At Head ==
    /// Links a detached entry as the new head.
    ///
    /// If the list was empty the entry becomes both head and tail. Returns
    /// false without touching the list if the handle is free or already linked.
    pub fn link_at_head(&mut self, handle: Handle) -> bool {
        let old_head = self.head;
        match self.get_mut(handle) {
            Some(entry) if !entry.linked => {
                entry.prev = None;
                entry.next = old_head;
                entry.linked = true;
            }
            _ => return false,
        }

        match old_head.and_then(|h| self.get_mut(h)) {
            Some(head) => head.prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
        self.len += 1;
        true
    }

    // == Unlink Tail ==
    /// Detaches the least recently used entry and returns its handle.
    ///
    /// The slot stays allocated until [`release`](Self::release) is called.
    /// Returns None on an empty list.
    pub fn unlink_tail(&mut self) -> Option<Handle> {
        let tail = self.tail?;
        self.detach(tail);
        Some(tail)
    }

    // == Move To Head ==
    /// Moves a linked entry to the head.
    ///
    /// No-op if the entry is already head, detached, or the slot is free.
    pub fn move_to_head(&mut self, handle: Handle) {
        if self.head == Some(handle) || !self.get(handle).is_some_and(|e| e.linked) {
            return;
        }
        self.detach(handle);
        self.link_at_head(handle);
    }

    /// Splices a linked entry out, repairing its neighbours and the ends.
    fn detach(&mut self, handle: Handle) {
        let (prev, next) = match self.get_mut(handle) {
            Some(entry) if entry.linked => {
                let links = (entry.prev, entry.next);
                entry.prev = None;
                entry.next = None;
                entry.linked = false;
                links
            }
            _ => return,
        };

        match prev.and_then(|h| self.get_mut(h)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|h| self.get_mut(h)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    // == Accessors ==
    pub fn head(&self) -> Option<Handle> {
        self.head
    }

    pub fn tail(&self) -> Option<Handle> {
        self.tail
    }

    /// Returns the number of linked entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates linked entries from head to tail.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}

/// Head-to-tail iterator over a [`RecencyList`].
pub struct Iter<'a, V> {
    list: &'a RecencyList<V>,
    cursor: Option<Handle>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a CacheEntry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.list.get(self.cursor?)?;
        self.cursor = entry.next;
        Some(entry)
    }
}
