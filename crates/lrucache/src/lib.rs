//! # lrucache
//!
//! Fixed-capacity key-value cache with least-recently-used eviction.
//!
//! ## Architecture
//! - **Index**: AHash map from key to node handle (O(1) lookup)
//! - **Recency list**: circular doubly-linked list in a node arena, with a
//!   sentinel at slot 0 joining the MRU and LRU ends (O(1) splice/evict)
//! - **Validation**: keys and values pass [`Validate`] before they are stored
//!
//! ## Example
//! ```
//! use lrucache::LruCache;
//!
//! let mut cache = LruCache::new(2);
//! cache.put(1, "one").unwrap();
//! cache.put(2, "two").unwrap();
//! cache.get(&1); // 2 is now least recently used
//! cache.put(3, "three").unwrap();
//!
//! assert_eq!(cache.get(&2), None);
//! assert_eq!(cache.get(&1), Some(&"one"));
//! assert_eq!(cache.len(), 2);
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod list;
mod stats;
mod validate;

pub use cache::LruCache;
pub use error::{Error, Result};
pub use list::Iter;
pub use stats::CacheStats;
pub use validate::Validate;
