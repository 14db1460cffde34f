//! Thread-safe LFU cache.
//!
//! [`ConcurrentLfuCache`] wraps the LFU state in a single
//! `parking_lot::Mutex`. One lock covers the whole read-modify-write span of
//! every operation, so a concurrent observer sees either the pre-operation
//! or the fully post-operation state, never a half-migrated bucket.
//!
//! # Why one lock, and why a Mutex?
//!
//! The three LFU indexes (key map, frequency buckets, minimum-frequency
//! cursor) are only consistent as a unit; locking them individually would
//! reintroduce exactly the races the lock exists to prevent. Sharding the
//! key space across segments would also change the policy itself: frequency
//! ordering and tie-break age would become per-segment rather than global,
//! and the evicted key would no longer be the globally least-frequent one.
//! A single lock keeps the eviction decision exact.
//!
//! `Mutex` rather than `RwLock` because every `get()` is a write: it
//! promotes the entry to the next frequency bucket. A read lock would never
//! be enough, so an `RwLock` would only add overhead.
//!
//! # Listener timing
//!
//! The eviction listener runs **after** the state lock has been released.
//! This makes the listener re-entrancy-safe: it may call back into the same
//! cache without deadlocking. The trade-off is ordering: between the
//! eviction and the listener call, other threads may observe (or further
//! mutate) the post-eviction cache. The one restriction is that a listener
//! must not call [`set_eviction_listener`](ConcurrentLfuCache::set_eviction_listener)
//! on the same cache, which would deadlock on the listener slot.
//!
//! # Example
//!
//! ```
//! use lfu_cache::ConcurrentLfuCache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache = Arc::new(ConcurrentLfuCache::new(1000));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 let key = format!("key_{}_{}", t, i);
//!                 cache.put(key.clone(), i);
//!                 let _ = cache.get(&key);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert!(cache.len() <= 1000);
//! ```

extern crate alloc;

use crate::config::LfuCacheConfig;
use crate::lfu::{EvictionListener, LfuSegment};
use crate::metrics::CacheMetrics;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroUsize;
use parking_lot::Mutex;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// A thread-safe LFU cache guarded by a single lock.
///
/// Shareable via `Arc`; all methods take `&self`. See the module docs for
/// the locking and listener-timing rationale.
pub struct ConcurrentLfuCache<K, V, S = DefaultHashBuilder> {
    segment: Mutex<LfuSegment<K, V, S>>,
    /// Kept outside the state lock so it can fire after release.
    listener: Mutex<Option<EvictionListener<V>>>,
}

impl<K: Hash + Eq, V> ConcurrentLfuCache<K, V> {
    /// Creates a concurrent LFU cache with the given capacity.
    ///
    /// A capacity of zero falls back to
    /// [`DEFAULT_CAPACITY`](crate::config::DEFAULT_CAPACITY).
    pub fn new(capacity: usize) -> ConcurrentLfuCache<K, V> {
        Self::init(LfuCacheConfig::new(capacity), None)
    }

    /// Creates a concurrent LFU cache from a configuration and an optional
    /// eviction listener.
    pub fn init(
        config: LfuCacheConfig,
        listener: Option<EvictionListener<V>>,
    ) -> ConcurrentLfuCache<K, V> {
        ConcurrentLfuCache {
            segment: Mutex::new(LfuSegment::with_hasher(config, DefaultHashBuilder::default())),
            listener: Mutex::new(listener),
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ConcurrentLfuCache<K, V, S> {
    /// Creates a concurrent LFU cache with the given capacity and hash
    /// builder.
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Self {
        ConcurrentLfuCache {
            segment: Mutex::new(LfuSegment::with_hasher(
                LfuCacheConfig::new(capacity),
                hash_builder,
            )),
            listener: Mutex::new(None),
        }
    }

    /// Sets the eviction listener, replacing any previous one.
    ///
    /// Must not be called from inside a running listener on the same cache.
    pub fn set_eviction_listener<F>(&self, listener: F)
    where
        F: Fn(V) + Send + 'static,
    {
        *self.listener.lock() = Some(Box::new(listener));
    }

    /// Returns the maximum number of entries the cache can hold.
    pub fn cap(&self) -> NonZeroUsize {
        self.segment.lock().cap()
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.segment.lock().len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.segment.lock().is_empty()
    }

    /// Returns a clone of the value for `key`, raising the entry's
    /// frequency by one.
    ///
    /// Cloning keeps the lock hold short. For zero-copy access use
    /// [`get_with`](ConcurrentLfuCache::get_with).
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.segment.lock().get(key).cloned()
    }

    /// Applies `f` to the value for `key` while the lock is held, raising
    /// the entry's frequency by one.
    ///
    /// `f` must not call back into this cache; the state lock is held for
    /// the duration of the call.
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.segment.lock().get(key).map(f)
    }

    /// Returns `true` if `key` is present, without affecting its frequency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().contains_key(key)
    }

    /// Returns the access frequency of `key`, without affecting it.
    pub fn frequency<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().frequency(key)
    }

    /// Inserts or updates an entry and returns the stored value.
    ///
    /// Same semantics as [`LfuCache::put`](crate::LfuCache::put), except
    /// that the eviction listener (when set) is invoked after the state
    /// lock has been released.
    pub fn put(&self, key: K, value: V) -> V
    where
        K: Clone,
        V: Clone,
    {
        let (evicted, stored) = {
            let mut segment = self.segment.lock();
            let (evicted, node) = segment.put(key, value);
            // SAFETY: node is the live node for the stored entry and the
            // state lock is still held
            let stored = unsafe { (*node).value().1.clone() };
            (evicted, stored)
        };

        // State lock released; the listener may re-enter the cache.
        if let Some((_key, old_value)) = evicted {
            if let Some(listener) = self.listener.lock().as_ref() {
                listener(old_value);
            }
        }
        stored
    }

    /// Clears the cache, removing all entries.
    ///
    /// The eviction listener is not invoked.
    pub fn clear(&self) {
        self.segment.lock().clear();
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CacheMetrics for ConcurrentLfuCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.segment.lock().metrics().metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        "ConcurrentLFU"
    }
}

impl<K, V, S> fmt::Debug for ConcurrentLfuCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentLfuCache")
            .field("segment", &self.segment.lock())
            .finish()
    }
}
