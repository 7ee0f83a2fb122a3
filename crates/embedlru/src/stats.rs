//! Cache statistics tracking

/// Counters for cache activity.
///
/// Updated by the owning cache on every mutating call; `peek` and
/// `contains` are not counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
    inserts: u64,
    updates: u64,
    evictions: u64,
    removals: u64,
}

impl CacheStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_insert(&mut self) {
        self.inserts += 1;
    }

    pub(crate) fn record_update(&mut self) {
        self.updates += 1;
    }

    /// An eviction is also an insert of the new key
    pub(crate) fn record_eviction(&mut self) {
        self.inserts += 1;
        self.evictions += 1;
    }

    pub(crate) fn record_removal(&mut self) {
        self.removals += 1;
    }

    /// Get total lookup hits
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Get total lookup misses
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Get total inserts of new keys
    pub fn inserts(&self) -> u64 {
        self.inserts
    }

    /// Get total inserts that replaced the value of a present key
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Get total capacity-driven evictions
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Get total explicit removals
    pub fn removals(&self) -> u64 {
        self.removals
    }

    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
