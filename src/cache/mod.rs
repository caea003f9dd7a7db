//! Kernel row cache
//!
//! SMO touches whole rows of the Gram matrix when it refreshes the error
//! cache, so rows are cached rather than single entries. Indices are local to
//! one binary sub-problem; every sub-machine owns its own cache.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::rc::Rc;

/// LRU cache of kernel matrix rows
pub struct KernelCache {
    rows: LruCache<usize, Rc<[f64]>>,
    row_len: usize,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache holding at most `capacity` rows of `row_len` values
    pub fn new(capacity: usize, row_len: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            rows: LruCache::new(capacity),
            row_len,
            hits: 0,
            misses: 0,
        }
    }

    /// Size the cache from a memory budget in bytes
    ///
    /// Always keeps room for two rows, which is what a single SMO step needs.
    pub fn with_memory_limit(memory_bytes: usize, row_len: usize) -> Self {
        let row_bytes = row_len.max(1) * std::mem::size_of::<f64>();
        Self::new((memory_bytes / row_bytes).max(2), row_len)
    }

    /// Fetch row `i`, computing it on a miss
    pub fn row<F>(&mut self, i: usize, compute: F) -> Rc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(row) = self.rows.get(&i) {
            self.hits += 1;
            return Rc::clone(row);
        }

        self.misses += 1;
        let row: Rc<[f64]> = compute().into();
        debug_assert_eq!(row.len(), self.row_len);
        self.rows.put(i, Rc::clone(&row));
        row
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.rows.cap().get(),
            size: self.rows.len(),
        }
    }

    /// Drop all rows and reset the counters
    pub fn clear(&mut self) {
        self.rows.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
