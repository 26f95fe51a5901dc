//! LRU Engine
//!
//! A generic keyed container with a recency order and a fixed entry-count
//! capacity. Two views over one owned collection:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        LruCache                           │
//! │                                                           │
//! │   index: HashMap<K, slot>      slots: Vec<Option<Node>>   │
//! │   ┌─────┬──────┐               ┌──────────────────────┐   │
//! │   │ "a" │  2   │──────────────>│ 2: a  prev=NIL next=0│   │
//! │   │ "b" │  0   │──────────────>│ 0: b  prev=2  next=1 │   │
//! │   │ "c" │  1   │──────────────>│ 1: c  prev=0  next=NIL   │
//! │   └─────┴──────┘               └──────────────────────┘   │
//! │                                 head = 2 (MRU)            │
//! │                                 tail = 1 (LRU)            │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The slot arena owns the entries; the index holds non-owning slot numbers
//! that are only ever invalidated by the engine's own mutations. Freed slots
//! are recycled through a free list, so long-lived caches do not grow the
//! arena beyond their high-water entry count.
//!
//! ## Recency Semantics
//!
//! - `get`/`get_mut` move the entry to the head (most recently used). A read
//!   is therefore a mutation of the linked order, which is why the engine
//!   exposes no shared-reference read path other than `peek`.
//! - `put` of an existing key replaces the value and moves it to the head.
//! - `put` of a new key at capacity removes the tail entry *before*
//!   inserting, so the capacity bound holds in every quiescent state.
//!
//! All operations are constant expected time. The engine itself is not
//! synchronized; the owning facade serializes access behind its lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel slot number for "no node".
const NIL: usize = usize::MAX;

/// One node of the doubly linked recency list.
struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// A generic least-recently-used cache.
///
/// # Example
/// ```
/// use embercache::cache::LruCache;
///
/// let mut lru = LruCache::new(2);
/// lru.put("a", 1);
/// lru.put("b", 2);
///
/// // Reading "a" refreshes it, so "b" is now the eviction candidate.
/// assert_eq!(lru.get(&"a"), Some(&1));
/// lru.put("c", 3);
///
/// assert_eq!(lru.get(&"b"), None);
/// assert_eq!(lru.get(&"a"), Some(&1));
/// assert_eq!(lru.get(&"c"), Some(&3));
/// ```
pub struct LruCache<K, V> {
    /// Key -> slot number of the node holding that key.
    index: HashMap<K, usize>,
    /// Arena of list nodes; `None` marks a recycled slot.
    slots: Vec<Option<Node<K, V>>>,
    /// Recycled slot numbers available for reuse.
    free: Vec<usize>,
    /// Most recently used node, or `NIL` when empty.
    head: usize,
    /// Least recently used node, or `NIL` when empty.
    tail: usize,
    /// Maximum number of live entries.
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an engine bounded to `capacity` entries.
    ///
    /// A capacity of zero is clamped to one; an LRU order over zero entries
    /// has no tail to evict.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity: capacity.max(1),
        }
    }

    /// Reads a value, refreshing its recency.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.detach(slot);
        self.push_front(slot);
        self.slots[slot].as_ref().map(|node| &node.value)
    }

    /// Reads a value mutably, refreshing its recency.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.detach(slot);
        self.push_front(slot);
        self.slots[slot].as_mut().map(|node| &mut node.value)
    }

    /// Reads a value without touching the recency order.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.slots[slot].as_ref().map(|node| &node.value)
    }

    /// Returns true if `key` is present, without refreshing it.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Inserts or replaces a value, moving the key to the head.
    ///
    /// Returns the displaced value when the key was already present. When
    /// inserting a new key at capacity, the tail entry is removed first.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            self.detach(slot);
            self.push_front(slot);
            return self.slots[slot]
                .as_mut()
                .map(|node| std::mem::replace(&mut node.value, value));
        }

        if self.index.len() >= self.capacity {
            self.pop_lru();
        }

        let slot = self.allocate(Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        self.push_front(slot);
        self.index.insert(key, slot);
        None
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        self.detach(slot);
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        Some(node.value)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let slot = self.tail;
        self.detach(slot);
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Returns the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        if self.tail == NIL {
            return None;
        }
        self.slots[self.tail]
            .as_ref()
            .map(|node| (&node.key, &node.value))
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true when no entries are held.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, evicting tail entries while the size exceeds
    /// the new bound.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.index.len() > self.capacity {
            self.pop_lru();
        }
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            cache: self,
            cursor: self.head,
        }
    }

    /// Claims a slot for `node`, reusing a freed slot when one exists.
    fn allocate(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Unlinks `slot` from the recency list, fixing up its neighbors and the
    /// head/tail cursors.
    fn detach(&mut self, slot: usize) {
        let (prev, next) = match self.slots[slot].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            NIL => self.head = next,
            _ => {
                if let Some(node) = self.slots[prev].as_mut() {
                    node.next = next;
                }
            }
        }
        match next {
            NIL => self.tail = prev,
            _ => {
                if let Some(node) = self.slots[next].as_mut() {
                    node.prev = prev;
                }
            }
        }

        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = NIL;
            node.next = NIL;
        }
    }

    /// Links a detached `slot` in at the head of the recency list.
    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = NIL;
            node.next = old_head;
        }
        match old_head {
            NIL => self.tail = slot,
            _ => {
                if let Some(node) = self.slots[old_head].as_mut() {
                    node.prev = slot;
                }
            }
        }
        self.head = slot;
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Iterator over entries in most-to-least recently used order.
pub struct Iter<'a, K, V> {
    cache: &'a LruCache<K, V>,
    cursor: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = self.cache.slots.get(self.cursor)?.as_ref()?;
        self.cursor = node.next;
        Some((&node.key, &node.value))
    }
}
