//! Fixed-width byte LRU cache
//!
//! Keys and values are opaque byte blocks whose widths are set once per
//! cache. Storage layout, for key width `kw` and capacity `n`:
//!
//! ```text
//! keys:   [ k0 | k1 | ... | k(n-1) | scratch ]   (n + 1) * kw bytes
//! values: [ v0 | v1 | ... | v(n-1) | scratch ]   (n + 1) * vw bytes
//! ```
//!
//! Slot 0 is the most recently used entry. The trailing scratch slot is
//! never an active entry; it receives whatever leaves the cache (an evicted
//! entry, a replaced value, a removed value) so the caller can borrow it
//! without any allocation.
//!
//! The storage is either owned or borrowed from the caller, which is useful
//! when the cache has to live in a statically reserved arena.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use crate::error::{reserve, Error, Part, Result};
use crate::outcome::Insertion;
use crate::stats::CacheStats;

/// Backing bytes for one half of the cache
enum Storage<'buf> {
    Owned(Vec<u8>),
    Borrowed(&'buf mut [u8]),
}

impl Storage<'static> {
    fn alloc(len: usize) -> Result<Self> {
        let mut buf = Vec::new();
        reserve(&mut buf, len)?;
        buf.resize(len, 0);
        Ok(Storage::Owned(buf))
    }
}

impl Deref for Storage<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Owned(buf) => buf,
            Storage::Borrowed(buf) => buf,
        }
    }
}

impl DerefMut for Storage<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(buf) => buf,
            Storage::Borrowed(buf) => buf,
        }
    }
}

/// LRU cache of fixed-width byte keys and values.
///
/// Lookups scan linearly and every promotion shifts bytes, so this is meant
/// for small capacities (tens of entries).
///
/// # Panics
/// Every operation taking a key or value panics if its length differs from
/// the configured width.
pub struct FixedLru<'buf> {
    keys: Storage<'buf>,
    values: Storage<'buf>,
    key_width: usize,
    value_width: usize,
    capacity: usize,
    len: usize,
    stats: CacheStats,
}

impl FixedLru<'static> {
    /// Create a cache that allocates and owns its storage
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries
    /// * `key_width` - Size of every key in bytes
    /// * `value_width` - Size of every value in bytes
    ///
    /// # Errors
    /// * [`Error::ZeroCapacity`] / [`Error::ZeroWidth`] on zero arguments
    /// * [`Error::Alloc`] if storage cannot be allocated
    pub fn new(capacity: u16, key_width: u8, value_width: u8) -> Result<Self> {
        validate(capacity, key_width, value_width)?;
        let slots = capacity as usize + 1;

        let keys = Storage::alloc(slots * key_width as usize)?;
        let values = Storage::alloc(slots * value_width as usize)?;

        debug!(capacity, key_width, value_width, "created fixed-width LRU cache");

        Ok(Self::from_parts(keys, values, capacity, key_width, value_width))
    }
}

impl<'buf> FixedLru<'buf> {
    /// Create a cache over caller-supplied storage
    ///
    /// Each buffer must hold `capacity + 1` entries; the extra slot is the
    /// scratch slot. The cache never allocates, and the buffers are
    /// released by their owner once the cache is dropped.
    ///
    /// # Errors
    /// * [`Error::ZeroCapacity`] / [`Error::ZeroWidth`] on zero arguments
    /// * [`Error::BufferTooSmall`] if either buffer is short
    pub fn with_buffers(
        capacity: u16,
        key_width: u8,
        value_width: u8,
        keys: &'buf mut [u8],
        values: &'buf mut [u8],
    ) -> Result<Self> {
        validate(capacity, key_width, value_width)?;
        let slots = capacity as usize + 1;

        check_buffer(Part::Key, keys.len(), slots * key_width as usize)?;
        check_buffer(Part::Value, values.len(), slots * value_width as usize)?;

        debug!(
            capacity,
            key_width,
            value_width,
            "created fixed-width LRU cache over borrowed storage"
        );

        Ok(Self::from_parts(
            Storage::Borrowed(keys),
            Storage::Borrowed(values),
            capacity,
            key_width,
            value_width,
        ))
    }

    fn from_parts(
        keys: Storage<'buf>,
        values: Storage<'buf>,
        capacity: u16,
        key_width: u8,
        value_width: u8,
    ) -> Self {
        Self {
            keys,
            values,
            key_width: key_width as usize,
            value_width: value_width as usize,
            capacity: capacity as usize,
            len: 0,
            stats: CacheStats::new(),
        }
    }

    /// Create an empty, self-owned cache with the same capacity and widths
    ///
    /// Entries are not copied.
    pub fn empty_like(&self) -> Result<FixedLru<'static>> {
        // Dimensions were validated when `self` was built, so the casts are lossless
        FixedLru::new(
            self.capacity as u16,
            self.key_width as u8,
            self.value_width as u8,
        )
    }

    /// Insert a key-value pair, making it the most recently used entry
    ///
    /// The returned outcome borrows the scratch slot: for
    /// [`Insertion::Updated`] it holds the replaced value, for
    /// [`Insertion::Evicted`] the entry that fell off the end.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Insertion<&[u8], &[u8]> {
        check_width(Part::Key, key.len(), self.key_width);
        check_width(Part::Value, value.len(), self.value_width);

        if let Some(idx) = self.position(key) {
            self.promote(idx);
            let front = self.value_range(0);
            let scratch = self.value_range(self.capacity);
            self.values.copy_within(front.clone(), scratch.start);
            self.values[front].copy_from_slice(value);
            self.stats.record_update();
            return Insertion::Updated {
                previous: self.scratch_value(),
            };
        }

        // Shift every active entry down one slot. When full, the LRU entry
        // lands in the scratch slot.
        let full = self.len == self.capacity;
        self.keys.copy_within(..self.len * self.key_width, self.key_width);
        self.values
            .copy_within(..self.len * self.value_width, self.value_width);

        let front = self.key_range(0);
        self.keys[front].copy_from_slice(key);
        let front = self.value_range(0);
        self.values[front].copy_from_slice(value);

        if full {
            self.stats.record_eviction();
            trace!(capacity = self.capacity, "evicted least recently used entry");
            Insertion::Evicted {
                key: self.scratch_key(),
                value: self.scratch_value(),
            }
        } else {
            self.len += 1;
            self.stats.record_insert();
            Insertion::Inserted
        }
    }

    /// Get a value from the cache, promoting it to most recently used
    pub fn get(&mut self, key: &[u8]) -> Option<&[u8]> {
        check_width(Part::Key, key.len(), self.key_width);

        match self.position(key) {
            Some(idx) => {
                self.promote(idx);
                self.stats.record_hit();
                Some(&self.values[self.value_range(0)])
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Get a value without touching its recency or the statistics
    pub fn peek(&self, key: &[u8]) -> Option<&[u8]> {
        check_width(Part::Key, key.len(), self.key_width);
        self.position(key)
            .map(|idx| &self.values[self.value_range(idx)])
    }

    /// Check whether a key is present, without promoting it
    pub fn contains(&self, key: &[u8]) -> bool {
        check_width(Part::Key, key.len(), self.key_width);
        self.position(key).is_some()
    }

    /// Remove a key from the cache
    ///
    /// The returned value borrows the scratch slot.
    pub fn remove(&mut self, key: &[u8]) -> Option<&[u8]> {
        check_width(Part::Key, key.len(), self.key_width);

        let idx = self.position(key)?;
        let (key_slot, value_slot) = (self.key_range(idx), self.value_range(idx));
        let scratch = self.capacity;

        self.keys.copy_within(key_slot, scratch * self.key_width);
        self.values.copy_within(value_slot, scratch * self.value_width);

        // Close the gap
        self.keys.copy_within(
            (idx + 1) * self.key_width..self.len * self.key_width,
            idx * self.key_width,
        );
        self.values.copy_within(
            (idx + 1) * self.value_width..self.len * self.value_width,
            idx * self.value_width,
        );
        self.len -= 1;

        self.stats.record_removal();
        trace!(index = idx, len = self.len, "removed entry");
        Some(self.scratch_value())
    }

    /// The entry that the next insert of a new key would evict
    pub fn peek_lru(&self) -> Option<(&[u8], &[u8])> {
        let idx = self.len.checked_sub(1)?;
        Some((
            &self.keys[self.key_range(idx)],
            &self.values[self.value_range(idx)],
        ))
    }

    /// Iterate over entries from most to least recently used
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&[u8], &[u8])> + ExactSizeIterator + '_ {
        let keys = self.keys[..self.len * self.key_width].chunks_exact(self.key_width);
        let values = self.values[..self.len * self.value_width].chunks_exact(self.value_width);
        keys.zip(values)
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the next insert of a new key will evict
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Get the maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of a key in bytes
    pub fn key_width(&self) -> usize {
        self.key_width
    }

    /// Size of a value in bytes
    pub fn value_width(&self) -> usize {
        self.value_width
    }

    /// True if the storage was supplied by the caller
    pub fn is_borrowed(&self) -> bool {
        matches!(self.keys, Storage::Borrowed(_))
    }

    /// Drop every entry; storage and statistics are kept
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset cache statistics
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn position(&self, key: &[u8]) -> Option<usize> {
        self.keys[..self.len * self.key_width]
            .chunks_exact(self.key_width)
            .position(|k| k == key)
    }

    /// Move the entry at `idx` to the front; entries before it shift back by one
    fn promote(&mut self, idx: usize) {
        if idx == 0 {
            return;
        }
        self.keys[..(idx + 1) * self.key_width].rotate_right(self.key_width);
        self.values[..(idx + 1) * self.value_width].rotate_right(self.value_width);
    }

    fn key_range(&self, idx: usize) -> std::ops::Range<usize> {
        idx * self.key_width..(idx + 1) * self.key_width
    }

    fn value_range(&self, idx: usize) -> std::ops::Range<usize> {
        idx * self.value_width..(idx + 1) * self.value_width
    }

    fn scratch_key(&self) -> &[u8] {
        &self.keys[self.key_range(self.capacity)]
    }

    fn scratch_value(&self) -> &[u8] {
        &self.values[self.value_range(self.capacity)]
    }
}

impl fmt::Debug for FixedLru<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedLru")
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .field("key_width", &self.key_width)
            .field("value_width", &self.value_width)
            .field("borrowed", &self.is_borrowed())
            .finish()
    }
}

fn validate(capacity: u16, key_width: u8, value_width: u8) -> Result<()> {
    if capacity == 0 {
        return Err(Error::ZeroCapacity);
    }
    if key_width == 0 {
        return Err(Error::ZeroWidth { which: Part::Key });
    }
    if value_width == 0 {
        return Err(Error::ZeroWidth { which: Part::Value });
    }
    Ok(())
}

fn check_buffer(which: Part, actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(Error::BufferTooSmall {
            which,
            required,
            actual,
        });
    }
    Ok(())
}

#[track_caller]
fn check_width(which: Part, actual: usize, expected: usize) {
    assert!(
        actual == expected,
        "{} must be exactly {} bytes, got {}",
        which,
        expected,
        actual
    );
}
