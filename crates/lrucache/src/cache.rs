//! LruCache: hash index over an arena recency list

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::num::NonZeroUsize;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::list::{Handle, Iter, RecencyList, SENTINEL};
use crate::stats::CacheStats;
use crate::validate::Validate;

/// Upper bound on slots reserved at construction; the rest grow on demand
const PREALLOC_LIMIT: usize = 1024;

/// Fixed-capacity cache with least-recently-used eviction.
///
/// `get`, `put` and `remove` are O(1) on average. The index maps each key to
/// its node in the recency list; a key is indexed exactly while its node is
/// linked.
///
/// The cache does no locking. Wrap it in a mutex to share it; even `get`
/// needs exclusive access because it reorders entries.
pub struct LruCache<K, V, S = RandomState> {
    /// Key -> node lookup
    index: HashMap<K, Handle, S>,

    /// Entries ordered from most to least recently used
    list: RecencyList<K, V>,

    /// Maximum number of entries
    capacity: usize,

    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone + Validate,
    V: Validate,
{
    /// Create a new cache holding at most `capacity` entries
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, RandomState::new())
    }

    /// Create a new cache with a capacity that is non-zero by construction
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self::new(capacity.get())
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone + Validate,
    V: Validate,
    S: BuildHasher,
{
    /// Create a new cache using `hasher` for the key index
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        debug!(capacity, "creating lru cache");

        let reserve = capacity.min(PREALLOC_LIMIT);
        Self {
            index: HashMap::with_capacity_and_hasher(reserve, hasher),
            list: RecencyList::with_capacity(reserve),
            capacity,
            stats: CacheStats::new(),
        }
    }

    /// Get a value and mark it most recently used
    ///
    /// Returns `None` on a miss. Keys that fail validation can never be
    /// stored, so they always miss here; use [`try_get`](Self::try_get) to
    /// tell the two apart.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&handle) => {
                self.list.move_to_front(handle);
                self.stats.record_hit();
                self.list.value(handle)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Like [`get`](Self::get), but rejects invalid keys
    ///
    /// # Returns
    /// * `Err(Error::InvalidKey)` - key failed validation, cache untouched
    /// * `Ok(None)` - valid key, not cached
    /// * `Ok(Some(value))` - hit, entry promoted
    pub fn try_get<Q>(&mut self, key: &Q) -> Result<Option<&V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Validate + ?Sized,
    {
        if !key.is_valid() {
            trace!("rejected lookup with invalid key");
            return Err(Error::InvalidKey);
        }

        Ok(self.get(key))
    }

    /// Insert or replace a value, making it most recently used
    ///
    /// When a new key arrives at a full cache, the least recently used entry
    /// is evicted first.
    ///
    /// # Errors
    /// `InvalidKey` / `InvalidValue` if either input fails validation. The
    /// cache is left unchanged in that case.
    pub fn put(&mut self, key: K, value: V) -> Result<()> {
        if !key.is_valid() {
            trace!("rejected put with invalid key");
            return Err(Error::InvalidKey);
        }
        if !value.is_valid() {
            trace!("rejected put with invalid value");
            return Err(Error::InvalidValue);
        }

        let replaced = self.index.remove(&key);
        if let Some(handle) = replaced {
            // Replace: the old node goes away, size is unchanged
            self.list.unlink(handle);
            self.list.free(handle);
            self.stats.record_update();
        } else {
            if self.index.len() == self.capacity {
                self.evict_lru();
            }
            self.stats.record_insert();
        }

        let handle = self.list.alloc(key.clone(), value);
        self.list.insert_after(handle, SENTINEL);
        self.index.insert(key, handle);
        if replaced.is_some() {
            trace!(len = self.index.len(), "replaced cached entry");
        }

        debug_assert!(self.index.len() <= self.capacity);
        debug_assert_eq!(self.index.len(), self.list.len());
        Ok(())
    }

    /// Remove a key, returning its value if it was cached
    ///
    /// Absent keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        self.list.unlink(handle);
        let (_, value) = self.list.free(handle)?;
        self.stats.record_removal();

        debug_assert_eq!(self.index.len(), self.list.len());
        Some(value)
    }

    /// Get a value without changing recency or stats
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .and_then(|&handle| self.list.value(handle))
    }

    /// Check for a key without changing recency or stats
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    fn evict_lru(&mut self) {
        let Some(tail) = self.list.tail() else {
            return;
        };

        self.list.unlink(tail);
        if let Some((key, _)) = self.list.free(tail) {
            let removed = self.index.remove(&key);
            debug_assert_eq!(removed, Some(tail), "index and list disagree on tail");
            self.stats.record_eviction();
            trace!(evictions = self.stats.evictions(), "evicted least recently used entry");
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        self.list.assert_consistent();
        assert_eq!(self.index.len(), self.list.len());
        assert!(self.index.len() <= self.capacity);
        for (key, &handle) in &self.index {
            let found = self.list.iter().any(|(k, _)| k == key);
            assert!(found, "indexed key missing from list");
            assert!(self.list.value(handle).is_some());
        }
    }
}

impl<K, V, S> LruCache<K, V, S> {
    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset hit/miss/eviction counters
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Drop every entry (statistics are kept)
    pub fn clear(&mut self) {
        debug!(len = self.len(), "clearing lru cache");
        self.index.clear();
        self.list.clear();
    }

    /// Iterate from most to least recently used without promoting anything
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.list.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a LruCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V, S>(cache: &LruCache<i32, V, S>) -> Vec<i32> {
        cache.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
        cache.assert_consistent();
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        cache.put(3, "c").unwrap(); // Should evict 1

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), Some(&"c"));
        assert_eq!(cache.stats().evictions(), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_lru_get_promotes() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        cache.get(&1); // Move 1 to front
        cache.put(3, "c").unwrap(); // Should evict 2

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&3), Some(&"c"));
        cache.assert_consistent();
    }

    #[test]
    fn test_get_at_head_keeps_order() {
        let mut cache = LruCache::new(3);
        for k in 1..=3 {
            cache.put(k, k).unwrap();
        }

        cache.get(&3);
        assert_eq!(keys(&cache), vec![3, 2, 1]);
        cache.assert_consistent();
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3);

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        cache.put(3, "c").unwrap();

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.stats().removals(), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cache = LruCache::new(3);
        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        let before = *cache.stats();

        assert_eq!(cache.remove(&9), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec![2, 1]);
        assert_eq!(*cache.stats(), before);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3);

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
        cache.assert_consistent();

        cache.put(3, "c").unwrap();
        assert_eq!(keys(&cache), vec![3]);
        cache.assert_consistent();
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a").unwrap();
        cache.put(1, "b").unwrap(); // Overwrite

        assert_eq!(cache.get(&1), Some(&"b"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inserts(), 1);
        assert_eq!(cache.stats().updates(), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_overwrite_on_full_cache_does_not_evict() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        cache.put(1, "c").unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions(), 0);
        assert_eq!(keys(&cache), vec![1, 2]);
        assert_eq!(cache.peek(&2), Some(&"b"));
        cache.assert_consistent();
    }

    #[test]
    fn test_put_rejects_invalid_value() {
        let mut cache: LruCache<i32, Option<i32>> = LruCache::new(2);
        cache.put(1, Some(1)).unwrap();

        assert_eq!(cache.put(5, None), Err(Error::InvalidValue));
        assert_eq!(cache.put(1, None), Err(Error::InvalidValue));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&1), Some(&Some(1)));
        assert_eq!(cache.stats().inserts(), 1);
        assert_eq!(cache.stats().updates(), 0);
        cache.assert_consistent();
    }

    #[test]
    fn test_put_rejects_invalid_key() {
        let mut cache: LruCache<Option<String>, i32> = LruCache::new(1);
        cache.put(Some("a".to_string()), 1).unwrap();

        assert_eq!(cache.put(None, 2), Err(Error::InvalidKey));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&Some("a".to_string())), Some(&1));
    }

    #[test]
    fn test_try_get_separates_invalid_from_missing() {
        let mut cache: LruCache<Option<i32>, i32> = LruCache::new(2);
        cache.put(Some(1), 1).unwrap();

        assert_eq!(cache.try_get(&None), Err(Error::InvalidKey));
        assert_eq!(cache.try_get(&Some(2)), Ok(None));
        assert_eq!(cache.try_get(&Some(1)), Ok(Some(&1)));

        // The rejected lookup is not counted
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 1);
    }

    #[test]
    fn test_peek_and_contains_do_not_promote() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        assert_eq!(cache.peek(&1), Some(&"a"));
        assert!(cache.contains(&1));
        cache.put(3, "c").unwrap(); // 1 is still the tail

        assert!(!cache.contains(&1));
        assert_eq!(cache.stats().lookups(), 0);
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let mut cache = LruCache::new(2);

        cache.put(1, 10).unwrap();
        cache.get(&1);
        cache.get(&1);
        cache.get(&2);

        assert_eq!(cache.stats().hits(), 2);
        assert_eq!(cache.stats().misses(), 1);

        cache.reset_stats();
        assert_eq!(cache.stats().lookups(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_iter_runs_mru_to_lru() {
        let mut cache = LruCache::new(4);
        for k in 1..=4 {
            cache.put(k, k * 10).unwrap();
        }
        cache.get(&2);

        let entries: Vec<_> = (&cache).into_iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(entries, vec![(2, 20), (4, 40), (3, 30), (1, 10)]);
    }

    #[test]
    fn test_custom_hasher() {
        let mut cache = LruCache::with_hasher(2, std::collections::hash_map::RandomState::new());

        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();
        cache.put(3, "c").unwrap();

        assert_eq!(keys(&cache), vec![3, 2]);
    }

    #[test]
    fn test_non_zero_capacity() {
        let cache: LruCache<i32, i32> = LruCache::with_capacity(NonZeroUsize::MIN);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_huge_capacity_grows_on_demand() {
        let mut cache: LruCache<u64, u64> = LruCache::new(usize::MAX);

        cache.put(1, 10).unwrap();

        assert_eq!(cache.capacity(), usize::MAX);
        assert_eq!(cache.get(&1), Some(&10));
        cache.assert_consistent();
    }

    #[test]
    fn test_replace_keeps_len() {
        let mut cache = LruCache::new(3);
        cache.put(1, "a").unwrap();
        cache.put(2, "b").unwrap();

        cache.put(2, "c").unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec![2, 1]);
        cache.assert_consistent();
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _cache: LruCache<i32, i32> = LruCache::new(0);
    }

    #[test]
    fn test_debug_output() {
        let mut cache = LruCache::new(3);
        cache.put(1, 1).unwrap();

        let out = format!("{:?}", cache);
        assert!(out.contains("capacity: 3"));
        assert!(out.contains("len: 1"));
    }
}
