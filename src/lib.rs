//! # lfu-cache
//!
//! A fixed-capacity, in-memory LFU (Least Frequently Used) cache with O(1)
//! amortized `get` and `put`, deterministic tie-break eviction and an
//! eviction notification hook. `no_std` compatible (requires `alloc`).
//!
//! ## How eviction works
//!
//! Every entry carries an access frequency, starting at 1 on insertion and
//! raised by exactly one on every hit and on every update of an existing
//! key. Entries are grouped into frequency buckets that preserve insertion
//! order:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ frequency buckets                                            │
//! │                                                              │
//! │   1 ──▶ [ d, g ]          ◀── min_frequency                  │
//! │   2 ──▶ [ a ]                                                │
//! │   5 ──▶ [ c, b ]                                             │
//! │         oldest ──▶ newest                                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! When a full cache takes a new key, the victim is the **oldest** entry of
//! the minimum-frequency bucket: "d" above. The minimum-frequency cursor is
//! maintained incrementally: frequencies only grow by single steps, so when
//! the minimum bucket drains during a promotion the new minimum is exactly
//! the next frequency, and no scan is ever needed.
//!
//! ## Quick start
//!
//! ```
//! use lfu_cache::LfuCache;
//!
//! let mut cache = LfuCache::new(2);
//! cache.put("rare", 1);
//! cache.put("popular", 2);
//!
//! for _ in 0..10 {
//!     cache.get(&"popular");
//! }
//!
//! cache.put("new", 3); // "rare" evicted (lowest frequency)
//! assert!(cache.get(&"popular").is_some());
//! assert!(cache.get(&"rare").is_none());
//! ```
//!
//! ## Eviction notifications
//!
//! A single optional listener receives each evicted value:
//!
//! ```
//! use lfu_cache::LfuCache;
//! use std::sync::{Arc, Mutex};
//!
//! let mut cache = LfuCache::new(2);
//! let evicted = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&evicted);
//! cache.set_eviction_listener(move |v| sink.lock().unwrap().push(v));
//!
//! cache.put(1, "A");
//! cache.put(2, "B");
//! cache.get(&1);
//! cache.put(3, "C"); // key 2 is the least frequently used
//! assert_eq!(evicted.lock().unwrap().as_slice(), &["B"]);
//! ```
//!
//! ## Concurrent use
//!
//! Enable the `concurrent` feature for [`ConcurrentLfuCache`], which guards
//! the whole structure with a single `parking_lot::Mutex` and fires the
//! eviction listener after releasing it:
//!
//! ```toml
//! [dependencies]
//! lfu-cache = { version = "0.1", features = ["concurrent"] }
//! ```
//!
//! ## API guarantees
//!
//! - The entry count never exceeds the capacity.
//! - Inserting below capacity never evicts; updating an existing key never
//!   evicts and raises its frequency exactly once.
//! - A lookup miss mutates nothing.
//! - A non-positive capacity silently falls back to the default (10); no
//!   operation returns an error or panics for any key/value input.
//! - Eviction is the only way an entry leaves the cache (apart from
//!   [`clear`](LfuCache::clear), which resets the whole structure).

#![no_std]

#[cfg(not(feature = "hashbrown"))]
extern crate std;

/// Cache configuration.
///
/// Provides [`LfuCacheConfig`] and the default-capacity fallback rule.
pub mod config;

/// Insertion-ordered frequency buckets.
///
/// Internal infrastructure: a doubly linked list with raw-pointer node
/// handles, giving O(1) unlink and oldest-first iteration order. Not part
/// of the public API.
pub(crate) mod list;

/// Least Frequently Used (LFU) cache implementation.
///
/// Provides the single-threaded [`LfuCache`] and the listener type.
pub mod lfu;

/// Cache metrics.
///
/// Hit/miss/eviction counters and frequency-distribution gauges, reported
/// through the [`CacheMetrics`](metrics::CacheMetrics) trait.
pub mod metrics;

/// Thread-safe LFU cache behind a single lock.
///
/// Available when the `concurrent` feature is enabled.
#[cfg(feature = "concurrent")]
pub mod concurrent;

pub use config::LfuCacheConfig;
pub use lfu::{EvictionListener, LfuCache};

#[cfg(feature = "concurrent")]
pub use concurrent::ConcurrentLfuCache;
