//! End-to-end acceptance scenario
//!
//! Keys are single bytes and values are `u32`, stored little-endian in the
//! byte-oriented cache.

use anyhow::{bail, ensure, Result};
use embedlru::{CacheStats, FixedLru, Insertion, LruCache};
use tracing::debug;

/// Width of a key in the byte-oriented cache
pub const KEY_WIDTH: u8 = 1;

/// Width of a value in the byte-oriented cache
pub const VALUE_WIDTH: u8 = 4;

/// Uniform view over the caches under test
pub trait Harness {
    fn insert(&mut self, key: u8, value: u32) -> Insertion<u8, u32>;
    fn get(&mut self, key: u8) -> Option<u32>;
    fn remove(&mut self, key: u8) -> Option<u32>;
    fn len(&self) -> usize;
    fn stats(&self) -> &CacheStats;
}

impl Harness for LruCache<u8, u32> {
    fn insert(&mut self, key: u8, value: u32) -> Insertion<u8, u32> {
        LruCache::insert(self, key, value)
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        LruCache::get(self, &key).copied()
    }

    fn remove(&mut self, key: u8) -> Option<u32> {
        LruCache::remove(self, &key)
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn stats(&self) -> &CacheStats {
        LruCache::stats(self)
    }
}

impl Harness for FixedLru<'_> {
    fn insert(&mut self, key: u8, value: u32) -> Insertion<u8, u32> {
        match FixedLru::insert(self, &[key], &value.to_le_bytes()) {
            Insertion::Inserted => Insertion::Inserted,
            Insertion::Updated { previous } => Insertion::Updated {
                previous: decode(previous),
            },
            Insertion::Evicted { key, value } => Insertion::Evicted {
                key: key[0],
                value: decode(value),
            },
        }
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        FixedLru::get(self, &[key]).map(decode)
    }

    fn remove(&mut self, key: u8) -> Option<u32> {
        FixedLru::remove(self, &[key]).map(decode)
    }

    fn len(&self) -> usize {
        FixedLru::len(self)
    }

    fn stats(&self) -> &CacheStats {
        FixedLru::stats(self)
    }
}

fn decode(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; VALUE_WIDTH as usize];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

/// Fill the cache, overflow it by one, then drain it, checking every step.
///
/// Key `k` carries value `k + 1`. The overflow key is `capacity + 1`
/// with value 100.
pub fn run<H: Harness>(cache: &mut H, capacity: u16) -> Result<()> {
    ensure!(
        (1..=254).contains(&capacity),
        "capacity {} does not fit single-byte keys",
        capacity
    );
    let capacity = capacity as u8;

    for key in 0..capacity {
        let value = key as u32 + 1;
        match cache.insert(key, value) {
            Insertion::Inserted => {}
            other => bail!("false ejection while filling key {}: {:?}", key, other),
        }
        match cache.get(key) {
            Some(found) if found == value => {}
            Some(found) => bail!("incorrect value for key {}: {} != {}", key, found, value),
            None => bail!("expected key {} not found in cache", key),
        }
    }
    ensure!(
        cache.len() == capacity as usize,
        "cache should be full: {} of {}",
        cache.len(),
        capacity
    );
    debug!(len = cache.len(), "cache filled");

    let overflow = capacity + 1;
    match cache.insert(overflow, 100) {
        Insertion::Evicted { key: 0, value: 1 } => {}
        other => bail!("incorrect item ejected from cache: {:?}", other),
    }

    match cache.remove(overflow) {
        Some(100) => {}
        other => bail!("remove of key {} returned {:?}", overflow, other),
    }

    match cache.insert(0, 1) {
        Insertion::Inserted => {}
        other => bail!("re-inserting key 0 reported {:?}", other),
    }
    debug!(len = cache.len(), "overflow entry replaced");

    for key in 0..capacity {
        let expected = key as u32 + 1;
        match cache.remove(key) {
            Some(found) if found == expected => {}
            other => bail!("remove of key {} returned {:?}, expected {}", key, other, expected),
        }
        ensure!(
            cache.get(key).is_none(),
            "unexpected key {} found in cache",
            key
        );
    }
    ensure!(cache.len() == 0, "cache should be empty but holds {}", cache.len());

    Ok(())
}
