//! Concurrency tests for the thread-safe LFU cache.
//!
//! Requires the `concurrent` feature. Exercises the single-lock guarantees:
//! the capacity bound under parallel writers, full-operation atomicity, and
//! the after-release listener timing.

use lfu_cache::ConcurrentLfuCache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn parallel_writers_respect_capacity() {
    let cache: Arc<ConcurrentLfuCache<String, usize>> = Arc::new(ConcurrentLfuCache::new(128));
    let mut handles = Vec::new();

    for t in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                let key = format!("key_{}_{}", t, i);
                cache.put(key.clone(), i);
                if i % 4 == 0 {
                    let _ = cache.get(&key);
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= 128);
    assert!(!cache.is_empty());
}

#[test]
fn every_overflow_evicts_exactly_once() {
    let cache: Arc<ConcurrentLfuCache<usize, usize>> = Arc::new(ConcurrentLfuCache::new(32));
    let evictions = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&evictions);
    cache.set_eviction_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut handles = Vec::new();
    for t in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            // Distinct key ranges per thread: every key is a fresh insert.
            for i in 0..250 {
                cache.put(t * 1000 + i, i);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // 1000 distinct inserts into a 32-slot cache: each insert past the
    // first 32 evicts exactly one entry.
    assert_eq!(cache.len(), 32);
    assert_eq!(evictions.load(Ordering::SeqCst), 1000 - 32);
}

#[test]
fn hot_keys_survive_churn() {
    let cache: Arc<ConcurrentLfuCache<String, u32>> = Arc::new(ConcurrentLfuCache::new(64));

    // Pin a few keys with high frequency before the churn starts.
    for i in 0..4 {
        let key = format!("hot_{}", i);
        cache.put(key.clone(), i);
        for _ in 0..1000 {
            let _ = cache.get(&key);
        }
    }

    let mut handles = Vec::new();
    for t in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                cache.put(format!("churn_{}_{}", t, i), i);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // One-shot churn keys never reach the hot keys' frequencies.
    for i in 0..4 {
        assert!(
            cache.contains_key(&format!("hot_{}", i)),
            "hot key {} was evicted",
            i
        );
    }
}

#[test]
fn listener_may_reenter_the_cache() {
    let cache: Arc<ConcurrentLfuCache<u32, u32>> = Arc::new(ConcurrentLfuCache::new(2));
    let seen: Arc<Mutex<Vec<(u32, usize)>>> = Arc::new(Mutex::new(Vec::new()));

    let probe = Arc::clone(&cache);
    let sink = Arc::clone(&seen);
    // The listener runs after the state lock is released, so it can call
    // back into the cache without deadlocking.
    cache.set_eviction_listener(move |v| {
        let len = probe.len();
        sink.lock().unwrap().push((v, len));
    });

    cache.put(1, 10);
    cache.put(2, 20);
    cache.get(&2);
    cache.put(3, 30); // evicts key 1

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[(10, 2)]);
}

#[test]
fn get_returns_clone_and_promotes() {
    let cache: ConcurrentLfuCache<&str, String> = ConcurrentLfuCache::new(4);
    cache.put("k", "value".to_string());

    assert_eq!(cache.get(&"k"), Some("value".to_string()));
    assert_eq!(cache.frequency(&"k"), Some(2));

    // get_with avoids the clone but still promotes.
    let len = cache.get_with(&"k", |v| v.len());
    assert_eq!(len, Some(5));
    assert_eq!(cache.frequency(&"k"), Some(3));
}

#[test]
fn operations_are_atomic_under_readers() {
    let cache: Arc<ConcurrentLfuCache<u32, u32>> = Arc::new(ConcurrentLfuCache::new(16));
    for i in 0..16 {
        cache.put(i, i);
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..2000u32 {
                // Readers must always observe a consistent structure:
                // len within bounds, hits returning the stored value.
                if let Some(v) = cache.get(&(i % 16)) {
                    assert_eq!(v, i % 16);
                }
                assert!(cache.len() <= 16);
            }
        }));
    }
    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 16..1016 {
                cache.put(i % 24, i % 24);
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    writer.join().unwrap();
    assert!(cache.len() <= 16);
}
