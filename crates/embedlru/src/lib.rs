//! # embedlru
//!
//! Fixed-capacity LRU cache for memory-constrained targets.
//!
//! ## Architecture
//! - **Contiguous storage**: keys and values in index-aligned arrays,
//!   most recently used first
//! - **Move-to-front**: hits and re-inserts rotate the entry to slot 0
//! - **Linear scan**: no hashing; sized for tens of entries
//! - **One allocation**: storage is reserved at construction, or supplied
//!   by the caller, and never grows
//!
//! Two front ends share these semantics:
//! - [`LruCache`] for typed keys and values
//! - [`FixedLru`] for opaque fixed-width byte blocks, optionally over
//!   caller-owned buffers
//!
//! ```
//! use embedlru::{Insertion, LruCache};
//!
//! let mut cache = LruCache::new(2).unwrap();
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.get(&"a");
//!
//! assert_eq!(cache.insert("c", 3), Insertion::Evicted { key: "b", value: 2 });
//! ```

#![warn(missing_docs)]

mod error;
mod fixed;
mod lru;
mod outcome;
mod stats;

pub use error::{Error, Part, Result};
pub use fixed::FixedLru;
pub use lru::LruCache;
pub use outcome::Insertion;
pub use stats::CacheStats;
