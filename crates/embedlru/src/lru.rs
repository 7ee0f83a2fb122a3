//! Typed LRU (Least Recently Used) cache implementation
//!
//! Keys and values live in two index-aligned vectors ordered from most
//! recently used (index 0) to least recently used (index `len - 1`). Both
//! vectors are reserved once at construction and never grow, so no
//! operation allocates.
//!
//! Lookups are a linear scan and promotions shift the prefix of the
//! vectors. This is only sensible for small capacities (tens of entries);
//! past that, a hashed cache is the right tool.

use std::borrow::Borrow;
use std::fmt;

use tracing::{debug, trace};

use crate::error::{reserve, Error, Result};
use crate::outcome::Insertion;
use crate::stats::CacheStats;

/// LRU cache with fixed capacity and contiguous storage
pub struct LruCache<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    capacity: usize,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: PartialEq,
{
    /// Create a new LRU cache holding at most `capacity` entries
    ///
    /// # Errors
    /// * [`Error::ZeroCapacity`] if `capacity` is 0
    /// * [`Error::Alloc`] if storage cannot be reserved
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        let mut keys = Vec::new();
        reserve(&mut keys, capacity)?;
        let mut values = Vec::new();
        reserve(&mut values, capacity)?;

        debug!(capacity, "created typed LRU cache");

        Ok(Self {
            keys,
            values,
            capacity,
            stats: CacheStats::new(),
        })
    }

    /// Insert a key-value pair, making it the most recently used entry
    ///
    /// If the key is present its value is replaced and the old value is
    /// returned in [`Insertion::Updated`]. If the cache is full, the least
    /// recently used entry is returned in [`Insertion::Evicted`].
    pub fn insert(&mut self, key: K, value: V) -> Insertion<K, V> {
        if let Some(idx) = self.position(&key) {
            let previous = std::mem::replace(&mut self.values[idx], value);
            self.promote(idx);
            self.stats.record_update();
            return Insertion::Updated { previous };
        }

        let evicted = if self.is_full() {
            self.keys.pop().zip(self.values.pop())
        } else {
            None
        };

        // Room for one more is guaranteed here, so neither call reallocates
        self.keys.insert(0, key);
        self.values.insert(0, value);

        match evicted {
            Some((key, value)) => {
                self.stats.record_eviction();
                trace!(capacity = self.capacity, "evicted least recently used entry");
                Insertion::Evicted { key, value }
            }
            None => {
                self.stats.record_insert();
                Insertion::Inserted
            }
        }
    }

    /// Get a value from the cache, promoting it to most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        if self.hit(key) {
            self.values.first()
        } else {
            None
        }
    }

    /// Get a mutable value from the cache, promoting it to most recently used
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        if self.hit(key) {
            self.values.first_mut()
        } else {
            None
        }
    }

    /// Get a value without touching its recency or the statistics
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).map(|idx| &self.values[idx])
    }

    /// Check whether a key is present, without promoting it
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).is_some()
    }

    /// Remove a key from the cache, returning its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        let idx = self.position(key)?;
        self.keys.remove(idx);
        let value = self.values.remove(idx);
        self.stats.record_removal();
        trace!(index = idx, len = self.keys.len(), "removed entry");
        Some(value)
    }

    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.keys.iter().position(|k| k.borrow() == key)
    }

    /// Look up and promote, recording hit or miss
    fn hit<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self.position(key) {
            Some(idx) => {
                self.promote(idx);
                self.stats.record_hit();
                true
            }
            None => {
                self.stats.record_miss();
                false
            }
        }
    }
}

impl<K, V> LruCache<K, V> {
    /// Move the entry at `idx` to the front; entries before it shift back by one
    fn promote(&mut self, idx: usize) {
        if idx == 0 {
            return; // Already at front
        }
        self.keys[..=idx].rotate_right(1);
        self.values[..=idx].rotate_right(1);
    }

    /// The entry that the next insert of a new key would evict
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.keys.last().zip(self.values.last())
    }

    /// Iterate over entries from most to least recently used
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.keys.iter().zip(self.values.iter())
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check if the next insert of a new key will evict
    pub fn is_full(&self) -> bool {
        self.keys.len() == self.capacity
    }

    /// Get the maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry; storage and statistics are kept
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset cache statistics
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl<K: Clone, V: Clone> Clone for LruCache<K, V> {
    fn clone(&self) -> Self {
        // Vec::clone would shrink to len and reallocate on the next insert
        let mut keys = Vec::with_capacity(self.capacity);
        keys.extend_from_slice(&self.keys);
        let mut values = Vec::with_capacity(self.capacity);
        values.extend_from_slice(&self.values);

        Self {
            keys,
            values,
            capacity: self.capacity,
            stats: self.stats,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

struct DebugEntries<'a, K, V>(&'a LruCache<K, V>);

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DebugEntries<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Clone, V>(cache: &LruCache<K, V>) -> Vec<K> {
        cache.iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2).unwrap();

        cache.insert(1, "a");
        cache.insert(2, "b");

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_zero_capacity() {
        let result = LruCache::<u8, u32>::new(0);
        assert!(matches!(result, Err(Error::ZeroCapacity)));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2).unwrap();

        assert_eq!(cache.insert(1, "a"), Insertion::Inserted);
        assert_eq!(cache.insert(2, "b"), Insertion::Inserted);
        assert_eq!(
            cache.insert(3, "c"),
            Insertion::Evicted { key: 1, value: "a" }
        );

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), Some(&"c"));
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[test]
    fn test_lru_update() {
        let mut cache = LruCache::new(2).unwrap();

        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.get(&1); // Move 1 to front
        assert_eq!(
            cache.insert(3, "c"),
            Insertion::Evicted { key: 2, value: "b" }
        );

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3).unwrap();

        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert_eq!(keys(&cache), vec![3, 1]);
    }

    #[test]
    fn test_lru_remove_missing() {
        let mut cache = LruCache::new(3).unwrap();

        cache.insert(1, "a");
        cache.insert(2, "b");

        assert_eq!(cache.remove(&9), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec![2, 1]);
        assert_eq!(cache.stats().removals(), 0);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3).unwrap();

        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.stats().inserts(), 2);
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = LruCache::new(2).unwrap();

        cache.insert(1, "a");
        cache.insert(2, "x");
        assert_eq!(cache.insert(1, "b"), Insertion::Updated { previous: "a" });

        assert_eq!(keys(&cache), vec![1, 2]);
        assert_eq!(cache.get(&1), Some(&"b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().updates(), 1);
    }

    #[test]
    fn test_lru_promotion_keeps_relative_order() {
        let mut cache = LruCache::new(5).unwrap();
        for i in 0..5 {
            cache.insert(i, i * 10);
        }
        assert_eq!(keys(&cache), vec![4, 3, 2, 1, 0]);

        cache.get(&1);
        assert_eq!(keys(&cache), vec![1, 4, 3, 2, 0]);

        cache.get(&1);
        assert_eq!(keys(&cache), vec![1, 4, 3, 2, 0]);

        assert_eq!(cache.peek_lru(), Some((&0, &0)));
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let mut cache = LruCache::new(2).unwrap();

        cache.insert(1, "a");
        cache.insert(2, "b");

        assert_eq!(cache.peek(&1), Some(&"a"));
        assert!(cache.contains(&1));
        assert!(!cache.contains(&3));
        assert_eq!(keys(&cache), vec![2, 1]);
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_lru_get_mut() {
        let mut cache = LruCache::new(2).unwrap();

        cache.insert(1, 10);
        cache.insert(2, 20);

        if let Some(value) = cache.get_mut(&1) {
            *value += 5;
        }

        assert_eq!(keys(&cache), vec![1, 2]);
        assert_eq!(cache.peek(&1), Some(&15));
        assert_eq!(cache.get_mut(&3), None);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_lru_borrowed_lookup() {
        let mut cache = LruCache::new(2).unwrap();

        cache.insert(String::from("alpha"), 1);
        cache.insert(String::from("beta"), 2);

        assert_eq!(cache.get("alpha"), Some(&1));
        assert_eq!(cache.remove("beta"), Some(2));
        assert!(!cache.contains("beta"));
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = LruCache::new(1).unwrap();

        assert_eq!(cache.insert('a', 1), Insertion::Inserted);
        assert!(cache.is_full());
        assert_eq!(
            cache.insert('b', 2),
            Insertion::Evicted { key: 'a', value: 1 }
        );
        assert_eq!(cache.insert('b', 3), Insertion::Updated { previous: 2 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_clone_is_independent() {
        let mut cache = LruCache::new(3).unwrap();
        cache.insert(1, 1);
        cache.insert(2, 2);

        let mut copy = cache.clone();
        copy.insert(3, 3);
        copy.insert(4, 4);

        assert_eq!(keys(&copy), vec![4, 3, 2]);
        assert_eq!(keys(&cache), vec![2, 1]);
        assert_eq!(copy.capacity(), 3);
    }

    #[test]
    fn test_lru_debug_lists_entries_in_order() {
        let mut cache = LruCache::new(2).unwrap();
        cache.insert(1, 'x');
        cache.insert(2, 'y');

        assert_eq!(
            format!("{:?}", cache),
            "LruCache { capacity: 2, entries: {2: 'y', 1: 'x'} }"
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8, u32),
        Get(u8),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        // Small key space so hits, updates and evictions all happen
        prop_oneof![
            (0u8..16, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            (0u8..16).prop_map(Op::Get),
            (0u8..16).prop_map(Op::Remove),
        ]
    }

    /// Reference ordering, most recently used first
    fn model_apply(model: &mut Vec<(u8, u32)>, capacity: usize, op: &Op) {
        match *op {
            Op::Insert(k, v) => {
                if let Some(idx) = model.iter().position(|(mk, _)| *mk == k) {
                    model.remove(idx);
                } else if model.len() == capacity {
                    model.pop();
                }
                model.insert(0, (k, v));
            }
            Op::Get(k) => {
                if let Some(idx) = model.iter().position(|(mk, _)| *mk == k) {
                    let entry = model.remove(idx);
                    model.insert(0, entry);
                }
            }
            Op::Remove(k) => {
                model.retain(|(mk, _)| *mk != k);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: cache ordering matches a naive reference model
        #[test]
        fn prop_matches_model(
            capacity in 1usize..=8,
            ops in proptest::collection::vec(op_strategy(), 0..64)
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            let mut model = Vec::new();

            for op in &ops {
                match *op {
                    Op::Insert(k, v) => { cache.insert(k, v); }
                    Op::Get(k) => { cache.get(&k); }
                    Op::Remove(k) => { cache.remove(&k); }
                }
                model_apply(&mut model, capacity, op);

                let actual: Vec<(u8, u32)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(&actual, &model);
            }
        }

        /// Property: len never exceeds capacity and keys stay unique
        #[test]
        fn prop_bounded_and_unique(
            capacity in 1usize..=8,
            inserts in proptest::collection::vec((0u8..32, any::<u32>()), 0..64)
        ) {
            let mut cache = LruCache::new(capacity).unwrap();

            for (k, v) in inserts {
                cache.insert(k, v);
                prop_assert!(cache.len() <= capacity);

                let mut seen: Vec<u8> = cache.iter().map(|(k, _)| *k).collect();
                seen.sort_unstable();
                seen.dedup();
                prop_assert_eq!(seen.len(), cache.len());
            }
        }

        /// Property: inserted value is returned by an immediate lookup
        #[test]
        fn prop_round_trip(
            capacity in 1usize..=8,
            prefill in proptest::collection::vec((any::<u8>(), any::<u32>()), 0..16),
            key in any::<u8>(),
            value in any::<u32>()
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            for (k, v) in prefill {
                cache.insert(k, v);
            }

            cache.insert(key, value);
            prop_assert_eq!(cache.get(&key), Some(&value));
        }

        /// Property: after `capacity` distinct inserts, the first one is evicted next
        #[test]
        fn prop_evicts_oldest(capacity in 1usize..=16, base in any::<u16>()) {
            let mut cache = LruCache::new(capacity).unwrap();
            let keys: Vec<u32> = (0..capacity as u32).map(|i| base as u32 + i).collect();

            for &k in &keys {
                prop_assert_eq!(cache.insert(k, k), Insertion::Inserted);
            }

            let overflow = base as u32 + capacity as u32;
            prop_assert_eq!(
                cache.insert(overflow, overflow),
                Insertion::Evicted { key: keys[0], value: keys[0] }
            );
        }
    }
}
