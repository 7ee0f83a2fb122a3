//! Error types for embedlru

use std::collections::TryReserveError;
use std::fmt;

/// Result type alias for embedlru operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which half of an entry a construction error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    /// The key side
    Key,
    /// The value side
    Value,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Key => f.write_str("key"),
            Part::Value => f.write_str("value"),
        }
    }
}

/// Errors raised while constructing a cache.
///
/// Once a cache exists, none of its operations can fail: misses are
/// reported as `None`.
#[derive(Debug)]
pub enum Error {
    /// Capacity of zero entries
    ZeroCapacity,

    /// Key or value width of zero bytes
    ZeroWidth {
        /// Offending side
        which: Part,
    },

    /// Caller-supplied buffer cannot hold `capacity + 1` entries
    BufferTooSmall {
        /// Offending side
        which: Part,
        /// Bytes needed
        required: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Backing storage could not be allocated
    Alloc {
        /// Size of the failed request in bytes
        bytes: usize,
        /// Allocator error
        source: TryReserveError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroCapacity => write!(f, "Cache capacity must be greater than 0"),
            Error::ZeroWidth { which } => write!(f, "{} width must be greater than 0", which),
            Error::BufferTooSmall {
                which,
                required,
                actual,
            } => write!(
                f,
                "{} buffer too small: {} bytes supplied, {} required",
                which, actual, required
            ),
            Error::Alloc { bytes, .. } => {
                write!(f, "Failed to allocate {} bytes of cache storage", bytes)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Alloc { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reserve exactly `additional` slots in `buf`, mapping failure to [`Error::Alloc`]
pub(crate) fn reserve<T>(buf: &mut Vec<T>, additional: usize) -> Result<()> {
    buf.try_reserve_exact(additional).map_err(|source| Error::Alloc {
        bytes: additional.saturating_mul(std::mem::size_of::<T>()),
        source,
    })
}
