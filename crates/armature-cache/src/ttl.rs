//! Bounded TTL cache with insertion-order eviction.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::clock::{Clock, SystemClock};

/// A cached value with its expiry.
#[derive(Debug, Clone)]
struct CacheItem<V> {
    value: V,
    expires_at: Instant,
}

/// TTL cache bounded to a fixed number of entries.
///
/// When full, inserting a new key evicts the oldest-inserted key. Reads do not
/// refresh an entry's position. Expired entries are removed lazily on read or
/// in bulk by [`TtlCache::sweep`]; a read cannot tell "expired" from "absent".
pub struct TtlCache<K, V> {
    entries: IndexMap<K, CacheItem<V>>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create a cache using the system clock.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`.
    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: IndexMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    /// Get an unexpired value, removing it if it has expired.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(item) if item.expires_at > now => Some(item.value.clone()),
            Some(_) => {
                self.entries.shift_remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a value with a fresh expiry.
    ///
    /// Replacing an existing key keeps its insertion position.
    pub fn insert(&mut self, key: K, value: V) {
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_entries {
                if self.entries.shift_remove_index(0).is_none() {
                    break;
                }
                tracing::debug!(max_entries = self.max_entries, "evicted oldest cache entry");
            }
        }

        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(key, CacheItem { value, expires_at });
    }

    /// Remove a key.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.shift_remove(key).map(|item| item.value)
    }

    /// Keep only entries whose key satisfies `keep`. Returns the number removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| keep(k));
        before - self.entries.len()
    }

    /// Remove every entry with `expiry <= now`. Returns the number removed.
    pub fn sweep(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, item| item.expires_at > now);
        before - self.entries.len()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured capacity.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache(ttl_secs: u64, max: usize) -> (TtlCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(ttl_secs), max, clock.clone());
        (cache, clock)
    }

    // === Expiry Tests ===

    #[test]
    fn test_get_before_expiry() {
        let (mut cache, clock) = cache(10, 4);
        cache.insert("a".to_string(), 1);
        clock.advance(Duration::from_secs(9));
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn test_get_at_expiry_is_miss_and_removes() {
        let (mut cache, clock) = cache(10, 4);
        cache.insert("a".to_string(), 1);
        clock.advance(Duration::from_secs(10));

        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_refreshes_expiry() {
        let (mut cache, clock) = cache(10, 4);
        cache.insert("a".to_string(), 1);
        clock.advance(Duration::from_secs(8));
        cache.insert("a".to_string(), 2);
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (mut cache, clock) = cache(10, 4);
        cache.insert("old".to_string(), 1);
        clock.advance(Duration::from_secs(6));
        cache.insert("new".to_string(), 2);
        clock.advance(Duration::from_secs(5));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get("old"), None);
        assert_eq!(cache.get("new"), Some(2));
    }

    // === Eviction Tests ===

    #[test]
    fn test_eviction_removes_earliest_inserted() {
        let (mut cache, _clock) = cache(60, 3);
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.insert(key.to_string(), i as u32);
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(1));
        assert_eq!(cache.get("c"), Some(2));
        assert_eq!(cache.get("d"), Some(3));
    }

    #[test]
    fn test_reads_do_not_affect_eviction_order() {
        let (mut cache, _clock) = cache(60, 2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.get("a"), Some(1));

        cache.insert("c".to_string(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_updating_existing_key_does_not_evict() {
        let (mut cache, _clock) = cache(60, 2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("a".to_string(), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_size_never_exceeds_max() {
        let (mut cache, _clock) = cache(60, 5);
        for i in 0..50 {
            cache.insert(format!("k{}", i), i);
            assert!(cache.len() <= 5);
        }
        let keys: Vec<_> = cache.keys().cloned().collect();
        assert_eq!(keys, vec!["k45", "k46", "k47", "k48", "k49"]);
    }

    // === Maintenance Tests ===

    #[test]
    fn test_retain_and_remove() {
        let (mut cache, _clock) = cache(60, 10);
        cache.insert("a/1".to_string(), 1);
        cache.insert("a/2".to_string(), 2);
        cache.insert("b/1".to_string(), 3);

        assert_eq!(cache.retain(|k| !k.starts_with("a/")), 2);
        assert_eq!(cache.remove("b/1"), Some(3));
        assert!(cache.is_empty());
    }
}
