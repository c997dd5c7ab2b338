//! Bounded in-memory item cache with LRU + cumulative-size eviction
//!
//! The cache is the only shared mutable state in the crate. All access —
//! the asynchronous fetch pipeline's side-effect inserts, synchronous
//! seeding, and lookups — goes through one `std::sync::Mutex` critical
//! section that is never held across I/O. The methods themselves are
//! synchronous and non-blocking, which is what lets the "seed the cache
//! right now" path and the fetch path share the exact same eviction and
//! accounting code.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;
use tracing::debug;

use crate::config::CacheConfig;
use crate::errors::CatalogError;
use crate::models::CatalogItem;

pub mod entry;

pub use entry::CacheEntry;

/// Point-in-time counters for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub cumulative_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejected: u64,
}

struct CacheInner {
    /// Access-ordered index; bounds are enforced by this module, not by
    /// the index itself
    entries: LruCache<String, CacheEntry>,
    cumulative_bytes: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    rejected: u64,
}

/// Concurrency-safe store mapping item identity to item value, bounded by
/// entry count and cumulative estimated size
///
/// Both `get` and `put` mark the touched entry most-recently-used.
/// Invariant after every operation: `entries ≤ max_entries` and
/// `cumulative_bytes ≤ max_bytes`.
pub struct BoundedCache {
    max_entries: NonZeroUsize,
    max_bytes: u64,
    fallback_item_bytes: u64,
    inner: Mutex<CacheInner>,
}

impl BoundedCache {
    pub fn new(max_entries: NonZeroUsize, max_bytes: u64, fallback_item_bytes: u64) -> Self {
        Self {
            max_entries,
            max_bytes,
            fallback_item_bytes,
            inner: Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                cumulative_bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                rejected: 0,
            }),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, CatalogError> {
        let max_entries = NonZeroUsize::new(config.max_entries)
            .ok_or_else(|| CatalogError::configuration("cache.max_entries must be > 0"))?;
        if config.max_bytes == 0 {
            return Err(CatalogError::configuration("cache.max_bytes must be > 0"));
        }
        Ok(Self::new(
            max_entries,
            config.max_bytes,
            config.fallback_item_bytes,
        ))
    }

    /// Look up an item by identity, marking it most-recently-used on hit
    pub fn get(&self, id: &str) -> Option<CatalogItem> {
        let mut inner = self.lock_inner();
        let found = inner.entries.get(id).map(|entry| entry.item.clone());
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Insert or update an item, evicting least-recently-used entries
    /// until both bounds hold
    ///
    /// Updating an existing identity adjusts the size accounting by the
    /// delta between the old and new estimate before anything else, so
    /// repeated overwrites cannot drift the cumulative count upward. An
    /// item whose own estimate exceeds the byte bound is rejected rather
    /// than admitted over-budget.
    pub fn put(&self, item: CatalogItem) {
        let entry = CacheEntry::new(item, self.fallback_item_bytes);
        let incoming_bytes = entry.estimated_bytes;
        let id = entry.item.id.clone();

        let mut inner = self.lock_inner();

        if incoming_bytes > self.max_bytes {
            inner.rejected += 1;
            debug!(
                item_id = %id,
                estimated_bytes = incoming_bytes,
                max_bytes = self.max_bytes,
                "item estimate exceeds cache byte bound, not cached"
            );
            return;
        }

        // Delta-correct update: retire the old estimate before admitting
        // the new one
        if let Some(previous) = inner.entries.pop(&id) {
            inner.cumulative_bytes = inner
                .cumulative_bytes
                .saturating_sub(previous.estimated_bytes);
        }

        while (inner.entries.len() >= self.max_entries.get()
            || inner.cumulative_bytes + incoming_bytes > self.max_bytes)
            && !inner.entries.is_empty()
        {
            if let Some((evicted_id, evicted)) = inner.entries.pop_lru() {
                inner.cumulative_bytes = inner
                    .cumulative_bytes
                    .saturating_sub(evicted.estimated_bytes);
                inner.evictions += 1;
                debug!(
                    item_id = %evicted_id,
                    freed_bytes = evicted.estimated_bytes,
                    "evicted least-recently-used entry"
                );
            }
        }

        inner.cumulative_bytes += incoming_bytes;
        inner.entries.put(id, entry);
    }

    /// True when the identity is resident; does not touch recency
    pub fn contains(&self, id: &str) -> bool {
        self.lock_inner().entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock_inner().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_inner().entries.is_empty()
    }

    /// Cumulative estimated size of all resident entries
    pub fn cumulative_bytes(&self) -> u64 {
        self.lock_inner().cumulative_bytes
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock_inner();
        CacheStats {
            entries: inner.entries.len(),
            cumulative_bytes: inner.cumulative_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            rejected: inner.rejected,
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, CacheInner> {
        // A panic while holding this lock leaves the accounting unusable
        // for the panicking path only; other paths continue with the data
        // as written
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageVariant, ImageVariantSet};
    use proptest::prelude::*;

    const FALLBACK: u64 = 100;

    fn sized_item(id: &str, size_bytes: u64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: format!("item {id}"),
            images: ImageVariantSet {
                original: Some(ImageVariant {
                    url: Some(format!("https://media.test/{id}.gif")),
                    size: Some(size_bytes.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn cache(max_entries: usize, max_bytes: u64) -> BoundedCache {
        BoundedCache::new(NonZeroUsize::new(max_entries).unwrap(), max_bytes, FALLBACK)
    }

    #[test]
    fn get_marks_recency_so_lru_victim_changes() {
        let cache = cache(2, u64::MAX);
        cache.put(sized_item("a", 10));
        cache.put(sized_item("b", 10));

        // Touch A so B becomes the LRU victim
        assert!(cache.get("a").is_some());
        cache.put(sized_item("c", 10));

        assert!(cache.contains("a"));
        assert!(cache.contains("c"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn byte_bound_evicts_independently_of_count_bound() {
        let cache = cache(10, 100);
        cache.put(sized_item("a", 60));
        cache.put(sized_item("b", 30));
        assert_eq!(cache.len(), 2);

        // 60 + 30 + 50 > 100: A (oldest) must go
        cache.put(sized_item("c", 50));
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.cumulative_bytes(), 80);
    }

    #[test]
    fn overwrite_adjusts_accounting_by_delta() {
        let cache = cache(10, 1000);
        cache.put(sized_item("a", 400));
        assert_eq!(cache.cumulative_bytes(), 400);

        // Same identity, smaller estimate: accounting must shrink
        cache.put(sized_item("a", 100));
        assert_eq!(cache.cumulative_bytes(), 100);
        assert_eq!(cache.len(), 1);

        // Repeated overwrites must not drift upward
        for _ in 0..50 {
            cache.put(sized_item("a", 100));
        }
        assert_eq!(cache.cumulative_bytes(), 100);
    }

    #[test]
    fn oversized_item_is_rejected_not_admitted_over_budget() {
        let cache = cache(10, 100);
        cache.put(sized_item("small", 40));
        cache.put(sized_item("huge", 500));

        assert!(!cache.contains("huge"));
        assert!(cache.contains("small"));
        assert_eq!(cache.stats().rejected, 1);
        assert_eq!(cache.cumulative_bytes(), 40);
    }

    #[test]
    fn undeclared_size_uses_fallback_estimate() {
        let cache = cache(10, 1000);
        let item = CatalogItem {
            id: "bare".to_string(),
            ..Default::default()
        };
        cache.put(item);
        assert_eq!(cache.cumulative_bytes(), FALLBACK);
    }

    #[test]
    fn stats_track_hits_misses_evictions() {
        let cache = cache(1, u64::MAX);
        cache.put(sized_item("a", 10));
        assert!(cache.get("a").is_some());
        assert!(cache.get("nope").is_none());
        cache.put(sized_item("b", 10));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn concurrent_writers_keep_accounting_consistent() {
        let cache = std::sync::Arc::new(cache(8, 500));
        let mut handles = Vec::new();
        for worker in 0..4 {
            let cache = std::sync::Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    cache.put(sized_item(&format!("{worker}-{i}"), 50));
                    cache.get(&format!("{worker}-{}", i / 2));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert!(stats.entries <= 8);
        assert!(stats.cumulative_bytes <= 500);
        // 8 entries of 50 bytes survive; accounting must agree exactly
        assert_eq!(stats.cumulative_bytes, stats.entries as u64 * 50);
    }

    proptest! {
        /// Both bounds hold after every single operation, for any
        /// interleaving of inserts, overwrites and lookups
        #[test]
        fn bounds_hold_for_arbitrary_operation_sequences(
            ops in proptest::collection::vec((0u8..16, 1u64..400, proptest::bool::ANY), 1..200)
        ) {
            let cache = cache(4, 1000);
            for (id, size, is_put) in ops {
                let id = format!("item-{id}");
                if is_put {
                    cache.put(sized_item(&id, size));
                } else {
                    cache.get(&id);
                }
                let stats = cache.stats();
                prop_assert!(stats.entries <= 4);
                prop_assert!(stats.cumulative_bytes <= 1000);
            }
        }
    }
}
