//! Measurement cache for memoizing per-item extents.
//!
//! The cache stores identity -> measured extent mappings. Entries are never
//! evicted individually: the cache grows for the lifetime of a data set and
//! is cleared wholesale when something global (e.g. font scale) changes
//! every measurement at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::item::{ItemKey, sanitize_extent};

/// A cache shared between the synchronous layout path and a background
/// recompute. The lock is held across one item's lookup-or-measure.
pub type SharedCache<K> = Arc<Mutex<MeasureCache<K>>>;

/// Lock a shared cache, recovering the guard if a previous holder panicked.
///
/// A panic inside a measurement leaves at worst a missing entry, which the
/// next lookup will simply measure again.
#[inline]
pub fn lock_cache<K>(cache: &SharedCache<K>) -> MutexGuard<'_, MeasureCache<K>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A persistent cache of item measurements, retained across renders.
#[derive(Debug)]
pub struct MeasureCache<K> {
    /// Measured extents, keyed by item identity.
    entries: HashMap<K, f32>,

    /// Lookups answered from the cache.
    hits: u64,

    /// Lookups that invoked the measurement accessor.
    misses: u64,
}

impl<K> Default for MeasureCache<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: ItemKey> MeasureCache<K> {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty cache behind a shared lock.
    pub fn shared() -> SharedCache<K> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Look up a cached extent without measuring.
    #[inline]
    pub fn get(&self, key: &K) -> Option<f32> {
        self.entries.get(key).copied()
    }

    /// Return the cached extent for `key`, measuring and storing it on a miss.
    ///
    /// The stored value is the sanitized raw measurement; clamping to a row
    /// width is the packer's job since it depends on the constraint.
    pub fn get_or_measure(&mut self, key: &K, measure: impl FnOnce(&K) -> f32) -> f32 {
        if let Some(extent) = self.entries.get(key) {
            self.hits += 1;
            return *extent;
        }

        self.misses += 1;
        let extent = sanitize_extent(key, measure(key));
        self.entries.insert(key.clone(), extent);
        extent
    }

    /// Drop every cached measurement and start counting stats afresh.
    pub fn invalidate_all(&mut self) {
        let (hits, misses) = self.stats();
        tracing::debug!(entries = self.entries.len(), hits, misses, "measurement cache invalidated");
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Whether `key` has a cached measurement.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache stats as `(hits, misses)`.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

// =========================================================================
// Tests
// =========================================================================
