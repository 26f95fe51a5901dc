//! Cache Entry Type
//!
//! One stored record: the value plus bookkeeping (refresh timestamp and
//! access counter). The bookkeeping is informational only; eviction is
//! driven purely by recency order in the engine.

use std::time::Instant;

/// Fixed per-entry overhead used by the memory estimator, approximating the
/// bookkeeping footprint of one record beyond its key and value bytes.
pub const ENTRY_OVERHEAD: usize = std::mem::size_of::<CacheEntry>();

/// A stored value with its bookkeeping metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value.
    pub value: String,
    /// When this entry was inserted or last refreshed.
    last_touched: Instant,
    /// How many times this entry has been read.
    access_count: u64,
}

impl CacheEntry {
    /// Creates a fresh entry for a newly written value.
    pub fn new(value: String) -> Self {
        Self {
            value,
            last_touched: Instant::now(),
            access_count: 0,
        }
    }

    /// Refreshes the timestamp and bumps the access counter. Called on every
    /// successful read.
    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
        self.access_count += 1;
    }

    /// When this entry was last written or read.
    pub fn last_touched(&self) -> Instant {
        self.last_touched
    }

    /// Number of reads served from this entry.
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// Estimated memory footprint of an entry with the given key and value.
    ///
    /// The estimate is `key bytes + value bytes + ENTRY_OVERHEAD`. It ignores
    /// index and recency-list node overhead, so it drifts from true resident
    /// memory; the admission and eviction logic only needs it to be
    /// consistent.
    pub fn footprint(key: &str, value: &str) -> usize {
        key.len() + value.len() + ENTRY_OVERHEAD
    }
}
