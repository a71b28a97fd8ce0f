//! In-memory cache for decoded images.
//!
//! Decoding a logo is the expensive part of every branded export: a PDF
//! with a header logo and a watermark would otherwise fetch and decode the
//! same picture for every page template. The [`ImageCache`] keeps decoded
//! results for the lifetime of an image session so repeat loads of the same
//! source are free.
//!
//! # Design
//!
//! ## Keys
//!
//! Entries are keyed by [`ImageSource::cache_key`](crate::imaging::ImageSource::cache_key).
//! URLs and paths key by themselves; inline data (data URLs, blobs) keys by
//! the SHA-256 of its content via [`hash_bytes`], so identical uploads share
//! an entry no matter how they reached the session.
//!
//! ## Bounds
//!
//! With no capacity the cache grows until [`ImageCache::clear`]. With a
//! capacity, inserting past it evicts the least recently used entry. Both
//! `get` and `insert` count as a use.
//!
//! Values are cloned out on hit, so callers store `Arc`s and every hit hands
//! out the same decoded image.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;

/// SHA-256 of `bytes` as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

struct Slot<V> {
    value: V,
    last_used: u64,
}

/// Key → value cache with optional LRU eviction.
pub struct ImageCache<V> {
    entries: HashMap<String, Slot<V>>,
    capacity: Option<NonZeroUsize>,
    clock: u64,
    stats: CacheStats,
}

impl<V: Clone> ImageCache<V> {
    /// Unbounded cache.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    pub fn with_capacity(capacity: Option<NonZeroUsize>) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up `key`, recording a hit or miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.tick();
        match self.entries.get_mut(key) {
            Some(slot) => {
                slot.last_used = now;
                self.stats.hit();
                Some(slot.value.clone())
            }
            None => {
                self.stats.miss();
                None
            }
        }
    }

    /// Look up `key` without touching recency or stats.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value` under `key`, evicting the least recently used entry if
    /// the cache is over capacity.
    pub fn insert(&mut self, key: String, value: V) {
        let now = self.tick();
        self.entries.insert(
            key,
            Slot {
                value,
                last_used: now,
            },
        );

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity.get() {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, slot)| slot.last_used)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        self.entries.remove(&k);
                        self.stats.evict();
                    }
                    None => break,
                }
            }
        }
    }

    /// Drop every entry. Stats are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl<V: Clone> Default for ImageCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of cache activity for a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub evictions: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn evict(&mut self) {
        self.evictions += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} decoded ({} total)",
                self.hits,
                self.misses,
                self.total()
            )?;
        } else {
            write!(f, "{} decoded", self.misses)?;
        }
        if self.evictions > 0 {
            write!(f, ", {} evicted", self.evictions)?;
        }
        Ok(())
    }
}
