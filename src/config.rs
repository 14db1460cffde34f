//! Configuration for the LFU cache.
//!
//! The configuration is a plain struct with a public field, in line with the
//! rest of the API: no builder, no constructor ceremony.
//!
//! # Examples
//!
//! ```
//! use lfu_cache::config::LfuCacheConfig;
//! use lfu_cache::LfuCache;
//!
//! let config = LfuCacheConfig { capacity: 100 };
//! let cache: LfuCache<String, i32> = LfuCache::init(config, None);
//!
//! // A zero capacity is not an error; it falls back to the default.
//! let config = LfuCacheConfig { capacity: 0 };
//! assert_eq!(config.effective_capacity().get(), 10);
//! ```

use core::fmt;
use core::num::NonZeroUsize;

/// Capacity used when the configured capacity is zero.
pub const DEFAULT_CAPACITY: usize = 10;

/// Configuration for an LFU (Least Frequently Used) cache.
///
/// # Fields
///
/// - `capacity`: maximum number of entries the cache can hold. A value of
///   zero is silently normalized to [`DEFAULT_CAPACITY`]; it is never an
///   error.
#[derive(Clone, Copy)]
pub struct LfuCacheConfig {
    /// Maximum number of key-value pairs the cache can hold.
    /// Zero falls back to [`DEFAULT_CAPACITY`].
    pub capacity: usize,
}

impl LfuCacheConfig {
    /// Creates a configuration with the given capacity.
    pub fn new(capacity: usize) -> Self {
        LfuCacheConfig { capacity }
    }

    /// Returns the capacity the cache will actually use.
    ///
    /// Zero normalizes to [`DEFAULT_CAPACITY`].
    pub fn effective_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity)
            .or(NonZeroUsize::new(DEFAULT_CAPACITY))
            .expect("DEFAULT_CAPACITY is non-zero")
    }
}

impl fmt::Debug for LfuCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCacheConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}
