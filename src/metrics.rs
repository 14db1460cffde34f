//! Cache metrics.
//!
//! Counter-based metrics reported through the [`CacheMetrics`] trait as a
//! `BTreeMap` so keys always come out in a deterministic order, which keeps
//! test output and exported reports reproducible.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Counters common to any cache policy.
#[derive(Debug, Default, Clone)]
pub struct CoreCacheMetrics {
    /// Total number of lookups made against the cache.
    pub requests: u64,

    /// Number of lookups that found their key.
    pub cache_hits: u64,

    /// Number of entries evicted to make room for new insertions.
    pub evictions: u64,
}

impl CoreCacheMetrics {
    /// Records a lookup that found its key.
    pub fn record_hit(&mut self) {
        self.requests += 1;
        self.cache_hits += 1;
    }

    /// Records a lookup that missed.
    ///
    /// Misses are derivable as `requests - cache_hits`.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Records a capacity eviction.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Fraction of lookups that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Fraction of lookups that missed, or 0.0 before any lookup.
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            (self.requests - self.cache_hits) as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Converts the core counters to a report map.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            (self.requests - self.cache_hits) as f64,
        );
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("requests".to_string(), self.requests as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        if self.requests > 0 {
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions as f64 / self.requests as f64,
            );
        }

        metrics
    }
}

/// LFU-specific metrics (extends [`CoreCacheMetrics`]).
///
/// LFU tracks a frequency count per entry, so these metrics describe the
/// shape of the frequency distribution on top of the core hit/miss counters.
#[derive(Debug, Default, Clone)]
pub struct LfuCacheMetrics {
    /// Core counters common to all cache policies.
    pub core: CoreCacheMetrics,

    /// Lowest frequency currently held by any live entry.
    pub min_frequency: u64,

    /// Highest frequency currently held by any live entry.
    pub max_frequency: u64,

    /// Total number of frequency promotions (every hit and every update of
    /// an existing key raises the entry's frequency by one).
    pub total_frequency_increments: u64,

    /// Number of distinct frequency levels currently populated.
    pub active_frequency_levels: u64,
}

impl LfuCacheMetrics {
    /// Creates a zeroed metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frequency promotion.
    pub fn record_frequency_increment(&mut self) {
        self.total_frequency_increments += 1;
    }

    /// Records a lookup that found its key.
    pub fn record_hit(&mut self) {
        self.core.record_hit();
    }

    /// Records a lookup that missed.
    pub fn record_miss(&mut self) {
        self.core.record_miss();
    }

    /// Records a capacity eviction.
    pub fn record_eviction(&mut self) {
        self.core.record_eviction();
    }

    /// Refreshes the frequency-distribution gauges from the bucket index.
    ///
    /// Generic over the bucket type; only the keys of the map matter here.
    pub fn observe_buckets<T>(&mut self, buckets: &BTreeMap<usize, T>) {
        self.active_frequency_levels = buckets.len() as u64;
        if let (Some(&min), Some(&max)) = (buckets.keys().next(), buckets.keys().next_back()) {
            self.min_frequency = min as u64;
            self.max_frequency = max as u64;
        } else {
            self.min_frequency = 0;
            self.max_frequency = 0;
        }
    }

    /// Average number of promotions per hit, or 0.0 before any hit.
    pub fn average_frequency(&self) -> f64 {
        if self.core.cache_hits > 0 {
            self.total_frequency_increments as f64 / self.core.cache_hits as f64
        } else {
            0.0
        }
    }

    /// Converts all counters and gauges to a report map.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();

        metrics.insert("min_frequency".to_string(), self.min_frequency as f64);
        metrics.insert("max_frequency".to_string(), self.max_frequency as f64);
        metrics.insert(
            "total_frequency_increments".to_string(),
            self.total_frequency_increments as f64,
        );
        metrics.insert(
            "active_frequency_levels".to_string(),
            self.active_frequency_levels as f64,
        );
        metrics.insert("average_frequency".to_string(), self.average_frequency());

        metrics
    }
}

/// Uniform metrics-reporting interface for cache implementations.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short name identifying the cache policy, e.g. `"LFU"`.
    fn algorithm_name(&self) -> &'static str;
}

impl CacheMetrics for LfuCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "LFU"
    }
}
