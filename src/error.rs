use thiserror::Error;

/// Errors reported by the fallible map and table operations.
///
/// Misses on the ordinary lookup and removal paths are expressed as `None`;
/// [`Error::KeyNotFound`] is only produced by the `Result`-returning
/// variants such as [`HashMap::take`](crate::HashMap::take).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested key is not present in the map.
    #[error("key not found")]
    KeyNotFound,

    /// A capacity of zero slots was requested.
    #[error("invalid capacity: {0} (capacity must be at least 1)")]
    InvalidCapacity(usize),

    /// The requested capacity cannot be rounded up to a power of two.
    #[error("capacity overflow")]
    CapacityOverflow,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
