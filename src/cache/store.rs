//! Cache Facade
//!
//! The facade wraps the [`LruCache`] engine with byte-level capacity
//! enforcement, admission control and hit/miss statistics. This is the type
//! the rest of the server talks to.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                        Cache                           │
//! │                                                        │
//! │   RwLock ──> LruCache<String, CacheEntry>              │
//! │                                                        │
//! │   memory_usage: AtomicUsize   (read without the lock)  │
//! │   max_capacity: AtomicUsize   (read without the lock)  │
//! │   hits / misses: AtomicU64    (updated lock-free)      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation that touches the recency order takes the exclusive side
//! of the lock; a `get` moves its entry to the head, so reads are writers
//! too. The counters live outside the lock: the pure accessors never
//! contend with the data path.
//!
//! ## Admission and Eviction
//!
//! Each entry's footprint is estimated as `key bytes + value bytes + a
//! fixed overhead`. A `set` is rejected outright when the entry alone
//! exceeds `max_capacity`. When admitting it would overflow the budget, the
//! facade evicts from the LRU tail until usage drops to the low-water mark
//! (80% of `max_capacity`), then re-checks headroom and rejects if the
//! entry still does not fit.

use crate::cache::entry::{CacheEntry, ENTRY_OVERHEAD};
use crate::cache::lru::LruCache;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Default byte budget: 1 GiB.
pub const DEFAULT_MAX_CAPACITY: usize = 1024 * 1024 * 1024;

/// The byte-bounded, statistics-keeping cache used by the server.
///
/// # Example
/// ```
/// use embercache::cache::Cache;
///
/// let cache = Cache::new();
/// assert!(cache.set("user:1".to_string(), "ada".to_string()));
/// assert_eq!(cache.get("user:1"), Some("ada".to_string()));
/// assert_eq!(cache.get("user:2"), None);
/// assert_eq!(cache.hits(), 1);
/// assert_eq!(cache.misses(), 1);
/// ```
pub struct Cache {
    /// The recency engine; guarded because every access mutates the order.
    engine: RwLock<LruCache<String, CacheEntry>>,

    /// Estimated bytes held by live entries. Mutated only while holding the
    /// engine write lock, readable without it.
    memory_usage: AtomicUsize,

    /// The byte budget. Mutable configuration.
    max_capacity: AtomicUsize,

    /// Reads that found a live entry.
    hits: AtomicU64,

    /// Reads that found nothing.
    misses: AtomicU64,
}

impl Cache {
    /// Creates a cache with the default 1 GiB budget.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Creates a cache with a custom byte budget.
    ///
    /// Admission is gated by bytes alone: any sequence of writes whose total
    /// footprint stays under the budget is retained in full, however many
    /// entries that is.
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self::with_limits(max_capacity, usize::MAX)
    }

    /// Creates a cache with a custom byte budget and an explicit entry-count
    /// bound on the recency engine. The count bound is a second, independent
    /// gate; callers who want the byte budget to be the only limit should
    /// use [`Cache::with_capacity`].
    pub fn with_limits(max_capacity: usize, entry_slots: usize) -> Self {
        Self {
            engine: RwLock::new(LruCache::new(entry_slots)),
            memory_usage: AtomicUsize::new(0),
            max_capacity: AtomicUsize::new(max_capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Inserts or overwrites a key.
    ///
    /// Returns false when the entry cannot be admitted: either its own
    /// footprint exceeds the whole budget, or eviction could not free
    /// enough room. A rejected `set` has no side effects.
    pub fn set(&self, key: String, value: String) -> bool {
        let size = CacheEntry::footprint(&key, &value);
        let max = self.max_capacity.load(Ordering::Relaxed);

        if size > max {
            return false;
        }

        let mut engine = self.engine.write();

        if self.memory_usage.load(Ordering::Relaxed) + size > max {
            self.evict_to_low_water(&mut engine);
            if self.memory_usage.load(Ordering::Relaxed) + size > max {
                return false;
            }
        }

        // When the engine carries an explicit entry-count bound, account for
        // the tail entry it would displace so the byte estimate stays exact.
        if !engine.contains_key(key.as_str()) && engine.len() >= engine.capacity() {
            if let Some((victim_key, victim)) = engine.pop_lru() {
                self.memory_usage.fetch_sub(
                    CacheEntry::footprint(&victim_key, &victim.value),
                    Ordering::Relaxed,
                );
            }
        }

        let key_len = key.len();
        if let Some(previous) = engine.put(key, CacheEntry::new(value)) {
            self.memory_usage.fetch_sub(
                key_len + previous.value.len() + ENTRY_OVERHEAD,
                Ordering::Relaxed,
            );
        }
        self.memory_usage.fetch_add(size, Ordering::Relaxed);
        true
    }

    /// Reads a key, refreshing its recency and bookkeeping.
    ///
    /// Returns an owned copy of the value; the lock is released before the
    /// value reaches the caller, so borrowing out of the store is not an
    /// option. Absence is `None`, never an empty-string sentinel.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut engine = self.engine.write();
        if let Some(entry) = engine.get_mut(key) {
            entry.touch();
            let value = entry.value.clone();
            drop(engine);
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(value)
        } else {
            drop(engine);
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Removes a key. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> bool {
        let mut engine = self.engine.write();
        match engine.remove(key) {
            Some(entry) => {
                self.memory_usage
                    .fetch_sub(CacheEntry::footprint(key, &entry.value), Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Drops every entry and zeroes the memory estimate. The hit/miss
    /// counters are lifetime totals and survive a clear.
    pub fn clear(&self) {
        let mut engine = self.engine.write();
        engine.clear();
        self.memory_usage.store(0, Ordering::Relaxed);
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.engine.read().len()
    }

    /// The configured byte budget.
    pub fn capacity(&self) -> usize {
        self.max_capacity.load(Ordering::Relaxed)
    }

    /// Estimated bytes held by live entries.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage.load(Ordering::Relaxed)
    }

    /// Lifetime count of successful reads.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lifetime count of failed reads.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of reads that hit, or 0.0 before the first read.
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    /// Updates the byte budget. When the new budget is below current usage,
    /// tail entries are evicted down to the low-water mark; the caller pays
    /// that latency while holding the lock.
    pub fn set_max_capacity(&self, max_capacity: usize) {
        self.max_capacity.store(max_capacity, Ordering::Relaxed);
        if self.memory_usage.load(Ordering::Relaxed) > max_capacity {
            let mut engine = self.engine.write();
            self.evict_to_low_water(&mut engine);
        }
    }

    /// Evicts tail entries until usage is at or below the low-water mark
    /// (80% of the budget) or the cache is empty. Returns whether the
    /// low-water condition was reached.
    fn evict_to_low_water(&self, engine: &mut LruCache<String, CacheEntry>) -> bool {
        let low_water = low_water_mark(self.max_capacity.load(Ordering::Relaxed));
        while self.memory_usage.load(Ordering::Relaxed) > low_water {
            match engine.pop_lru() {
                Some((key, entry)) => {
                    self.memory_usage
                        .fetch_sub(CacheEntry::footprint(&key, &entry.value), Ordering::Relaxed);
                }
                None => break,
            }
        }
        self.memory_usage.load(Ordering::Relaxed) <= low_water
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("size", &self.size())
            .field("memory_usage", &self.memory_usage())
            .field("max_capacity", &self.capacity())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

/// Eviction target: floor of 80% of the budget.
fn low_water_mark(max_capacity: usize) -> usize {
    (max_capacity as u128 * 4 / 5) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::ENTRY_OVERHEAD;

    /// Footprint of one entry as the facade computes it.
    fn footprint(key: &str, value: &str) -> usize {
        key.len() + value.len() + ENTRY_OVERHEAD
    }

    #[test]
    fn test_set_get_remove_roundtrip() {
        let cache = Cache::new();

        assert!(cache.set("foo".to_string(), "bar".to_string()));
        assert_eq!(cache.get("foo"), Some("bar".to_string()));
        assert!(cache.remove("foo"));
        assert_eq!(cache.get("foo"), None);
        assert!(!cache.remove("foo"));
    }

    #[test]
    fn test_overwrite_collapses() {
        let cache = Cache::new();

        assert!(cache.set("k".to_string(), "v1".to_string()));
        let usage_after_first = cache.memory_usage();

        assert!(cache.set("k".to_string(), "v2".to_string()));
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get("k"), Some("v2".to_string()));
        // v1 and v2 are the same length, so usage is unchanged.
        assert_eq!(cache.memory_usage(), usage_after_first);
    }

    #[test]
    fn test_overwrite_accounts_for_size_change() {
        let cache = Cache::new();

        cache.set("k".to_string(), "short".to_string());
        cache.set("k".to_string(), "a much longer value".to_string());
        assert_eq!(cache.memory_usage(), footprint("k", "a much longer value"));

        cache.set("k".to_string(), "s".to_string());
        assert_eq!(cache.memory_usage(), footprint("k", "s"));
    }

    #[test]
    fn test_memory_usage_tracks_entries() {
        let cache = Cache::new();
        assert_eq!(cache.memory_usage(), 0);

        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "22".to_string());
        assert_eq!(
            cache.memory_usage(),
            footprint("a", "1") + footprint("b", "22")
        );

        cache.remove("a");
        assert_eq!(cache.memory_usage(), footprint("b", "22"));

        cache.clear();
        assert_eq!(cache.memory_usage(), 0);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_hit_miss_statistics() {
        let cache = Cache::new();
        assert_eq!(cache.hit_ratio(), 0.0);

        cache.set("a".to_string(), "1".to_string());
        cache.get("a");
        cache.get("a");
        cache.get("missing");

        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
        assert!((cache.hit_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_counters_survive_clear() {
        let cache = Cache::new();
        cache.set("a".to_string(), "1".to_string());
        cache.get("a");
        cache.get("missing");

        cache.clear();

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_oversized_entry_rejected_without_side_effects() {
        let cache = Cache::with_capacity(ENTRY_OVERHEAD + 8);
        cache.set("a".to_string(), "1".to_string());
        let usage = cache.memory_usage();

        // Larger than the whole budget: rejected outright.
        assert!(!cache.set("big".to_string(), "x".repeat(64)));
        assert_eq!(cache.memory_usage(), usage);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_entry_equal_to_capacity_needs_empty_cache() {
        let key = "k";
        let value = "v".repeat(100);
        let exact = footprint(key, &value);

        // Empty cache: an entry exactly as large as the budget is admitted.
        let cache = Cache::with_capacity(exact);
        assert!(cache.set(key.to_string(), value.clone()));
        assert_eq!(cache.memory_usage(), exact);

        // Non-empty cache: eviction stops at the low-water mark, which
        // leaves the survivor in place, so the entry cannot fit.
        let cache = Cache::with_capacity(exact);
        assert!(cache.set("other".to_string(), "x".to_string()));
        assert!(!cache.set(key.to_string(), value));
        assert_eq!(cache.get("other"), Some("x".to_string()));
    }

    #[test]
    fn test_eviction_frees_lru_entries_first() {
        // Budget sized for roughly three entries.
        let entry = footprint("k0", "0123456789");
        let cache = Cache::with_capacity(entry * 3 + entry / 2);

        assert!(cache.set("k0".to_string(), "0123456789".to_string()));
        assert!(cache.set("k1".to_string(), "0123456789".to_string()));
        assert!(cache.set("k2".to_string(), "0123456789".to_string()));

        // Refresh k0 so k1 is the eviction candidate.
        cache.get("k0");

        assert!(cache.set("k3".to_string(), "0123456789".to_string()));

        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k0"), Some("0123456789".to_string()));
        assert_eq!(cache.get("k3"), Some("0123456789".to_string()));
        assert!(cache.memory_usage() <= cache.capacity());
    }

    #[test]
    fn test_set_max_capacity_downscale_hits_low_water() {
        let cache = Cache::new();
        for i in 0..100 {
            cache.set(format!("key-{i}"), "x".repeat(32));
        }
        let usage = cache.memory_usage();
        assert!(usage > 0);

        let new_capacity = usage / 2;
        cache.set_max_capacity(new_capacity);

        assert_eq!(cache.capacity(), new_capacity);
        assert!(
            cache.memory_usage() <= new_capacity * 4 / 5 || cache.size() == 0,
            "usage {} exceeds low water of {}",
            cache.memory_usage(),
            new_capacity
        );
    }

    #[test]
    fn test_entry_slot_bound_is_byte_accounted() {
        // Two recency slots: the third insert displaces the oldest entry
        // and its bytes must be released.
        let cache = Cache::with_limits(DEFAULT_MAX_CAPACITY, 2);

        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        cache.set("c".to_string(), "3".to_string());

        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(
            cache.memory_usage(),
            footprint("b", "2") + footprint("c", "3")
        );
    }

    #[test]
    fn test_small_entries_beyond_ten_thousand_are_retained() {
        // Admission is byte-only: tens of thousands of small entries that
        // stay under the budget must all survive with their latest values.
        let cache = Cache::new();
        for i in 0..12_000 {
            assert!(cache.set(format!("key-{i}"), format!("value-{i}")));
        }

        assert_eq!(cache.size(), 12_000);
        for i in 0..12_000 {
            assert_eq!(cache.get(&format!("key-{i}")), Some(format!("value-{i}")));
        }
        assert!(cache.memory_usage() <= cache.capacity());
    }

    #[test]
    fn test_empty_value_is_stored_and_distinguishable() {
        let cache = Cache::new();
        assert!(cache.set("empty".to_string(), String::new()));

        // The facade reports presence; only the wire layer folds an empty
        // value into NOT_FOUND.
        assert_eq!(cache.get("empty"), Some(String::new()));
        assert_eq!(cache.get("absent"), None);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(Cache::new());
        let mut handles = Vec::new();

        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("key-{}-{}", t, i % 50);
                    cache.set(key.clone(), format!("value-{i}"));
                    let _ = cache.get(&key);
                    if i % 10 == 0 {
                        cache.remove(&key);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Quiesced: the engine and the estimator must agree.
        let expected: usize = {
            let engine = cache.engine.read();
            engine
                .iter()
                .map(|(k, e)| CacheEntry::footprint(k, &e.value))
                .sum()
        };
        assert_eq!(cache.memory_usage(), expected);
        assert_eq!(cache.hits() + cache.misses(), 4 * 500);
    }
}
