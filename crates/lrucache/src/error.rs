//! Error types for lrucache

use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Caller errors reported by the cache.
///
/// A missing key is never an error; lookups return `None` for that.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Key failed [`Validate`](crate::Validate) (null)
    #[error("invalid key: null keys cannot be cached")]
    InvalidKey,

    /// Value failed [`Validate`](crate::Validate) (null)
    #[error("invalid value: null values cannot be cached")]
    InvalidValue,
}
