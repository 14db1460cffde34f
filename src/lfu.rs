//! Least Frequently Used cache implementation.
//!
//! Tracks an access count per entry and, at capacity, evicts an entry with
//! the lowest count. Ties break deterministically: among entries sharing the
//! minimum frequency, the one that entered that frequency bucket first is
//! evicted.
//!
//! Three coupled indexes back the cache:
//!
//! - a key map holding the current frequency and bucket node of each entry,
//! - a frequency-ordered map of insertion-ordered buckets,
//! - a `min_frequency` cursor pointing at the lowest populated bucket.
//!
//! The cursor is maintained incrementally. Frequencies only ever grow by one
//! per access, so when the minimum bucket empties during a promotion the new
//! minimum is exactly the next frequency; no scan is needed, and `get` and
//! `put` stay O(1) amortized.

extern crate alloc;

use crate::config::LfuCacheConfig;
use crate::list::{Bucket, Node};
use crate::metrics::{CacheMetrics, LfuCacheMetrics};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroUsize;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Callback invoked with each value the cache evicts.
///
/// Receives exactly one evicted value per eviction event and must not assume
/// any particular thread identity.
pub type EvictionListener<V> = Box<dyn Fn(V) + Send>;

/// Frequency and bucket node of a live entry, keyed by the entry's key.
type KeySlot<K, V> = (usize, *mut Node<(K, V)>);

/// Internal LFU state shared by [`LfuCache`] (single-threaded) and
/// [`ConcurrentLfuCache`](crate::ConcurrentLfuCache) (behind a mutex).
///
/// Invariants, upheld before and after every public operation:
///
/// 1. A key is present in `map` iff it owns exactly one node in `buckets`.
/// 2. The node of key `k` lives in `buckets[map[k].0]`.
/// 3. `map.len() <= capacity`.
/// 4. `min_frequency` is the smallest populated bucket key, or `None` iff
///    the cache is empty.
/// 5. Buckets never stay empty; they are pruned as they drain (transient
///    staleness within a single operation aside).
///
/// A violation of 1 or 2 is a bug in this module and is treated as fatal.
///
/// # Safety
///
/// `map` stores raw node pointers. A pointer is valid as long as its node is
/// linked into one of `buckets`' lists and the segment has not been dropped.
pub(crate) struct LfuSegment<K, V, S = DefaultHashBuilder> {
    /// Configuration for the LFU cache.
    config: LfuCacheConfig,

    /// Lowest populated frequency; `None` iff the cache is empty.
    min_frequency: Option<usize>,

    /// Map from keys to their frequency and bucket node.
    map: HashMap<K, KeySlot<K, V>, S>,

    /// Map from frequency to the insertion-ordered bucket of entries
    /// currently at that frequency.
    buckets: BTreeMap<usize, Bucket<(K, V)>>,

    /// Hit/miss and frequency-distribution counters.
    metrics: LfuCacheMetrics,
}

// SAFETY: LfuSegment owns all of its data; the raw pointers in `map` only
// point at nodes owned by `buckets`. Moving the segment across threads moves
// the whole structure.
unsafe impl<K: Send, V: Send, S: Send> Send for LfuSegment<K, V, S> {}

// SAFETY: every mutation requires &mut self; shared references cannot race.
unsafe impl<K: Send, V: Send, S: Sync> Sync for LfuSegment<K, V, S> {}

impl<K: Hash + Eq, V, S: BuildHasher> LfuSegment<K, V, S> {
    /// Creates an empty segment from a configuration and hash builder.
    pub(crate) fn with_hasher(config: LfuCacheConfig, hash_builder: S) -> Self {
        let map_capacity = config.effective_capacity().get().next_power_of_two();
        LfuSegment {
            config,
            min_frequency: None,
            map: HashMap::with_capacity_and_hasher(map_capacity, hash_builder),
            buckets: BTreeMap::new(),
            metrics: LfuCacheMetrics::new(),
        }
    }

    /// Returns the maximum number of entries the segment can hold.
    #[inline]
    pub(crate) fn cap(&self) -> NonZeroUsize {
        self.config.effective_capacity()
    }

    /// Returns the current number of entries.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the segment holds no entries.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns a reference to the segment's metrics.
    #[inline]
    pub(crate) fn metrics(&self) -> &LfuCacheMetrics {
        &self.metrics
    }

    /// Moves a node from its current bucket to the next-higher one and keeps
    /// `min_frequency` current. Returns the node's (possibly re-linked)
    /// pointer; the caller must write the new frequency and pointer back
    /// into the key map.
    ///
    /// # Safety
    ///
    /// `node` must be the live bucket node of a key whose recorded frequency
    /// is `old_frequency`.
    unsafe fn promote(
        &mut self,
        node: *mut Node<(K, V)>,
        old_frequency: usize,
    ) -> *mut Node<(K, V)> {
        let new_frequency = old_frequency + 1;
        self.metrics.record_frequency_increment();

        let bucket = self
            .buckets
            .get_mut(&old_frequency)
            .expect("live entry has no bucket for its frequency");
        // SAFETY: the caller guarantees node is linked into this bucket
        let detached =
            unsafe { bucket.remove(node) }.expect("bucket out of sync with the key map");

        // Prune drained buckets. When the minimum bucket drains, the new
        // minimum is exactly old + 1: frequencies only grow by single steps.
        if bucket.is_empty() {
            self.buckets.remove(&old_frequency);
            if self.min_frequency == Some(old_frequency) {
                self.min_frequency = Some(new_frequency);
            }
        }

        let node = Box::into_raw(detached);
        // SAFETY: node was just detached from its old bucket
        unsafe {
            self.buckets
                .entry(new_frequency)
                .or_insert_with(Bucket::new)
                .adopt_newest(node);
        }
        self.metrics.observe_buckets(&self.buckets);
        node
    }

    /// Returns a reference to the value for `key`, promoting its frequency.
    ///
    /// A miss touches no index: frequencies, buckets and the minimum cursor
    /// are left exactly as they were.
    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (frequency, node) = match self.map.get(key) {
            Some(&slot) => slot,
            None => {
                self.metrics.record_miss();
                return None;
            }
        };
        self.metrics.record_hit();

        // SAFETY: the slot came from the map, so node is live in its bucket
        let node = unsafe { self.promote(node, frequency) };
        let slot = self.map.get_mut(key).expect("key vanished during promotion");
        slot.0 = frequency + 1;
        slot.1 = node;

        // SAFETY: promote returned the re-linked, initialized node
        unsafe { Some(&(*node).value().1) }
    }

    /// Returns a mutable reference to the value for `key`, promoting its
    /// frequency.
    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (frequency, node) = match self.map.get(key) {
            Some(&slot) => slot,
            None => {
                self.metrics.record_miss();
                return None;
            }
        };
        self.metrics.record_hit();

        // SAFETY: the slot came from the map, so node is live in its bucket
        let node = unsafe { self.promote(node, frequency) };
        let slot = self.map.get_mut(key).expect("key vanished during promotion");
        slot.0 = frequency + 1;
        slot.1 = node;

        // SAFETY: promote returned the re-linked, initialized node
        unsafe { Some(&mut (*node).value_mut().1) }
    }

    /// Returns `true` if `key` is live, without touching its frequency.
    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Returns the current frequency of `key`, without touching it.
    pub(crate) fn frequency<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).map(|&(frequency, _)| frequency)
    }

    /// Inserts or updates an entry.
    ///
    /// Returns the pair evicted to make room (if any) together with the node
    /// now holding the stored value. Updating an existing key replaces its
    /// value and promotes its frequency exactly once; it never evicts.
    pub(crate) fn put(&mut self, key: K, value: V) -> (Option<(K, V)>, *mut Node<(K, V)>)
    where
        K: Clone,
    {
        if let Some(&(frequency, node)) = self.map.get(&key) {
            // SAFETY: the slot came from the map, so node is live in its bucket
            unsafe { (*node).value_mut().1 = value };
            // A write to an existing key counts as one use: the same
            // promotion bookkeeping as a hit, applied exactly once.
            let node = unsafe { self.promote(node, frequency) };
            let slot = self.map.get_mut(&key).expect("key vanished during promotion");
            slot.0 = frequency + 1;
            slot.1 = node;
            return (None, node);
        }

        let mut evicted = None;
        if self.map.len() >= self.cap().get() {
            evicted = self.evict();
        }

        let node = self
            .buckets
            .entry(1)
            .or_insert_with(Bucket::new)
            .push_newest((key.clone(), value));
        // A fresh insertion is always the new minimum-frequency candidate.
        self.min_frequency = Some(1);
        self.map.insert(key, (1, node));
        self.metrics.observe_buckets(&self.buckets);

        (evicted, node)
    }

    /// Removes and returns the eviction victim: the oldest entry of the
    /// minimum-frequency bucket. Returns `None` on an empty cache.
    fn evict(&mut self) -> Option<(K, V)> {
        let min = self.min_frequency?;
        let bucket = self
            .buckets
            .get_mut(&min)
            .expect("min_frequency points at a missing bucket");
        let victim = bucket
            .pop_oldest()
            .expect("min_frequency points at an empty bucket");
        if bucket.is_empty() {
            self.buckets.remove(&min);
            // min_frequency is stale for the rest of this call at most; the
            // insertion that follows an eviction resets it to 1.
        }

        // SAFETY: the victim was just detached from its bucket
        let (key, value) = unsafe { victim.into_value() };
        self.map.remove(&key);
        self.metrics.record_eviction();
        Some((key, value))
    }

    /// Removes every entry and resets the minimum-frequency cursor.
    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.buckets.clear();
        self.min_frequency = None;
        self.metrics.observe_buckets(&self.buckets);
    }
}

// Manual Debug since the key map holds raw pointers.
impl<K, V, S> fmt::Debug for LfuSegment<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuSegment")
            .field("capacity", &self.config.effective_capacity())
            .field("len", &self.map.len())
            .field("min_frequency", &self.min_frequency)
            .finish()
    }
}

/// An implementation of a Least Frequently Used (LFU) cache.
///
/// The cache tracks an access frequency per entry and evicts the least
/// frequently used entry when it is full. Among entries tied at the minimum
/// frequency, the one that entered that frequency bucket first is evicted.
///
/// Construction never fails: a capacity of zero falls back to
/// [`DEFAULT_CAPACITY`](crate::config::DEFAULT_CAPACITY).
///
/// An optional eviction listener receives each evicted value. The listener
/// is invoked synchronously from [`put`](LfuCache::put); since `put` takes
/// `&mut self` the listener cannot re-enter the cache. A listener panic
/// propagates to the `put` caller rather than being swallowed.
///
/// # Examples
///
/// ```
/// use lfu_cache::LfuCache;
///
/// let mut cache = LfuCache::new(2);
/// cache.put("a", 1);
/// cache.put("b", 2);
///
/// // Accessing "a" raises its frequency above "b"'s.
/// assert_eq!(cache.get(&"a"), Some(&1));
///
/// cache.put("c", 3); // "b" is evicted (lowest frequency)
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.get(&"a"), Some(&1));
/// ```
///
/// Observing evictions:
///
/// ```
/// use lfu_cache::LfuCache;
/// use std::sync::{Arc, Mutex};
///
/// let mut cache = LfuCache::new(2);
/// let evicted = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&evicted);
/// cache.set_eviction_listener(move |v| sink.lock().unwrap().push(v));
///
/// cache.put(1, "A");
/// cache.put(2, "B");
/// cache.get(&1);
/// cache.put(3, "C"); // evicts key 2
/// assert_eq!(evicted.lock().unwrap().as_slice(), &["B"]);
/// ```
pub struct LfuCache<K, V, S = DefaultHashBuilder> {
    segment: LfuSegment<K, V, S>,
    listener: Option<EvictionListener<V>>,
}

impl<K: Hash + Eq, V> LfuCache<K, V> {
    /// Creates an LFU cache with the given capacity.
    ///
    /// A capacity of zero falls back to
    /// [`DEFAULT_CAPACITY`](crate::config::DEFAULT_CAPACITY); this is not an
    /// error.
    pub fn new(capacity: usize) -> LfuCache<K, V> {
        Self::init(LfuCacheConfig::new(capacity), None)
    }

    /// Creates an LFU cache from a configuration and an optional eviction
    /// listener.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfu_cache::config::LfuCacheConfig;
    /// use lfu_cache::LfuCache;
    ///
    /// let config = LfuCacheConfig { capacity: 100 };
    /// let cache: LfuCache<String, i32> = LfuCache::init(config, None);
    /// assert_eq!(cache.cap().get(), 100);
    /// ```
    pub fn init(config: LfuCacheConfig, listener: Option<EvictionListener<V>>) -> LfuCache<K, V> {
        LfuCache {
            segment: LfuSegment::with_hasher(config, DefaultHashBuilder::default()),
            listener,
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> LfuCache<K, V, S> {
    /// Creates an LFU cache with the given capacity and hash builder.
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Self {
        LfuCache {
            segment: LfuSegment::with_hasher(LfuCacheConfig::new(capacity), hash_builder),
            listener: None,
        }
    }

    /// Sets the eviction listener, replacing any previous one.
    ///
    /// At most one listener is active at a time. The listener receives each
    /// evicted value, synchronously, from within the `put` call that caused
    /// the eviction.
    pub fn set_eviction_listener<F>(&mut self, listener: F)
    where
        F: Fn(V) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Returns the maximum number of entries the cache can hold.
    #[inline]
    pub fn cap(&self) -> NonZeroUsize {
        self.segment.cap()
    }

    /// Returns the current number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.segment.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }

    /// Returns a reference to the value for `key` and raises the entry's
    /// frequency by one.
    ///
    /// A miss returns `None` and leaves every frequency, bucket and the
    /// minimum-frequency cursor untouched.
    ///
    /// The key may be any borrowed form of the cache's key type, as long as
    /// [`Hash`] and [`Eq`] on the borrowed form match the key type's.
    #[inline]
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.get(key)
    }

    /// Returns a mutable reference to the value for `key` and raises the
    /// entry's frequency by one.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.get_mut(key)
    }

    /// Returns `true` if `key` is present, without affecting its frequency.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.contains_key(key)
    }

    /// Returns the access frequency of `key`, without affecting it.
    ///
    /// Entries start at frequency 1; every [`get`](LfuCache::get),
    /// [`get_mut`](LfuCache::get_mut) and update of an existing key raises
    /// the frequency by exactly one.
    #[inline]
    pub fn frequency<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.frequency(key)
    }

    /// Inserts or updates an entry and returns a reference to the stored
    /// value.
    ///
    /// Updating an existing key replaces its value and counts as one use:
    /// the entry's frequency rises by exactly one, the same bookkeeping as a
    /// [`get`](LfuCache::get). An update never evicts.
    ///
    /// Inserting a new key while full first evicts the oldest entry of the
    /// minimum-frequency bucket and hands its value to the eviction listener
    /// (when one is set). New entries start at frequency 1.
    pub fn put(&mut self, key: K, value: V) -> &V
    where
        K: Clone,
    {
        let (evicted, node) = self.segment.put(key, value);
        if let Some((_key, old_value)) = evicted {
            if let Some(listener) = self.listener.as_ref() {
                listener(old_value);
            }
        }
        // SAFETY: node is the live bucket node just stored for this key
        unsafe { &(*node).value().1 }
    }

    /// Clears the cache, removing all entries.
    ///
    /// The eviction listener is not invoked: clearing is a reset, not an
    /// eviction.
    #[inline]
    pub fn clear(&mut self) {
        self.segment.clear()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CacheMetrics for LfuCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.segment.metrics().metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        self.segment.metrics().algorithm_name()
    }
}

impl<K, V, S> fmt::Debug for LfuCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("segment", &self.segment)
            .field("listener", &self.listener.as_ref().map(|_| "set"))
            .finish()
    }
}
