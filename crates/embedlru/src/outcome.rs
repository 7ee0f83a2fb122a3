//! Result of an insert

/// What an insert did to the cache.
///
/// Replacing the value of a present key and pushing the least-recently-used
/// entry out are different events, so they are separate variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion<K, V> {
    /// New key stored, nothing displaced
    Inserted,

    /// Key was already present; its value was replaced and it was promoted
    Updated {
        /// Value held before the insert
        previous: V,
    },

    /// New key stored into a full cache; the LRU entry was dropped
    Evicted {
        /// Key of the evicted entry
        key: K,
        /// Value of the evicted entry
        value: V,
    },
}

impl<K, V> Insertion<K, V> {
    /// True if the key was already present
    pub fn is_update(&self) -> bool {
        matches!(self, Insertion::Updated { .. })
    }

    /// True if an entry was evicted to make room
    pub fn is_eviction(&self) -> bool {
        matches!(self, Insertion::Evicted { .. })
    }

    /// The value that left the cache, whether replaced or evicted
    pub fn displaced_value(&self) -> Option<&V> {
        match self {
            Insertion::Inserted => None,
            Insertion::Updated { previous } => Some(previous),
            Insertion::Evicted { value, .. } => Some(value),
        }
    }

    /// The evicted entry, if any
    pub fn into_evicted(self) -> Option<(K, V)> {
        match self {
            Insertion::Evicted { key, value } => Some((key, value)),
            _ => None,
        }
    }
}

impl Insertion<&[u8], &[u8]> {
    /// Copy a borrowed byte outcome out of the cache's scratch slot
    pub fn to_vec(&self) -> Insertion<Vec<u8>, Vec<u8>> {
        match *self {
            Insertion::Inserted => Insertion::Inserted,
            Insertion::Updated { previous } => Insertion::Updated {
                previous: previous.to_vec(),
            },
            Insertion::Evicted { key, value } => Insertion::Evicted {
                key: key.to_vec(),
                value: value.to_vec(),
            },
        }
    }
}
