// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded in-memory cache of encoded tiles.
//!
//! Entries are keyed by the data version they were rendered from together with
//! the request path, so reloading different data never serves stale tiles.
//! The cache holds at most `max_bytes` of tile data and evicts the least
//! recently used entries to make room.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::dataset::DataVersion;
use crate::tile::TileRequest;

/// Default byte budget: 64 MiB.
pub const DEFAULT_CACHE_MAX_BYTES: usize = 64 * 1024 * 1024;

/// Identifies one encoded tile of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub version: DataVersion,
    pub path: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(version: DataVersion, tile: TileRequest) -> Self {
        Self {
            version,
            path: tile.path(),
        }
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub bytes: usize,
}

#[derive(Debug)]
struct Entry {
    data: Arc<[u8]>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<CacheKey, Entry>,
    /// Last-use tick to key, oldest first.
    recency: BTreeMap<u64, CacheKey>,
    bytes: usize,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl State {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.bytes -= entry.data.len();
            trace!("evicted {} ({} bytes)", key.path, entry.data.len());
        }
        true
    }
}

/// Thread-safe LRU of PNG bytes with a byte budget.
///
/// A budget of zero disables caching: every lookup misses and nothing is
/// stored.
#[derive(Debug)]
pub struct TileCache {
    state: Mutex<State>,
    max_bytes: usize,
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_MAX_BYTES)
    }
}

impl TileCache {
    /// Create a cache holding at most `max_bytes` of tile data.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            max_bytes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation leaves the state consistent, so a poisoned lock is
        // still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a tile, marking it as recently used on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<[u8]>> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let now = state.tick();
        if let Some(entry) = state.entries.get_mut(key) {
            state.recency.remove(&entry.last_used);
            state.recency.insert(now, key.clone());
            entry.last_used = now;
            state.hits += 1;
            Some(Arc::clone(&entry.data))
        } else {
            state.misses += 1;
            None
        }
    }

    /// Store a tile, evicting older entries until it fits.
    ///
    /// Returns `false` when the tile is larger than the whole budget and was
    /// not stored. Replaces any previous value for the same key.
    pub fn insert(&self, key: CacheKey, data: Arc<[u8]>) -> bool {
        let size = data.len();
        if size > self.max_bytes || self.max_bytes == 0 {
            debug!("not caching {} ({size} bytes exceeds budget)", key.path);
            return false;
        }

        let mut state = self.lock();
        if let Some(previous) = state.entries.remove(&key) {
            state.recency.remove(&previous.last_used);
            state.bytes -= previous.data.len();
        }
        while state.bytes + size > self.max_bytes && state.evict_lru() {}

        let last_used = state.tick();
        state.bytes += size;
        state.recency.insert(last_used, key.clone());
        state.entries.insert(key, Entry { data, last_used });
        true
    }

    /// Whether `key` is cached, without touching its recency or the counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Current counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
            bytes: state.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(version: u64, x: u32) -> CacheKey {
        CacheKey::new(DataVersion::from_raw(version), TileRequest::new(5, x, 10))
    }

    fn bytes(len: usize) -> Arc<[u8]> {
        vec![7u8; len].into()
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = TileCache::new(1024);
        assert!(cache.get(&key(1, 0)).is_none());
        assert!(cache.insert(key(1, 0), bytes(10)));
        assert_eq!(cache.get(&key(1, 0)).unwrap().len(), 10);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.bytes, 10);
    }

    #[test]
    fn test_versions_do_not_collide() {
        let cache = TileCache::new(1024);
        cache.insert(key(1, 0), bytes(10));
        assert!(cache.get(&key(2, 0)).is_none());
        assert!(cache.contains(&key(1, 0)));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = TileCache::new(30);
        cache.insert(key(1, 0), bytes(10));
        cache.insert(key(1, 1), bytes(10));
        cache.insert(key(1, 2), bytes(10));

        // Touch the oldest so the second entry becomes the eviction target.
        cache.get(&key(1, 0));
        cache.insert(key(1, 3), bytes(10));

        assert!(cache.contains(&key(1, 0)));
        assert!(!cache.contains(&key(1, 1)));
        assert!(cache.contains(&key(1, 2)));
        assert!(cache.contains(&key(1, 3)));
        assert!(cache.stats().bytes <= 30);
    }

    #[test]
    fn test_eviction_follows_access_order() {
        let cache = TileCache::new(40);
        for x in 0..4 {
            cache.insert(key(1, x), bytes(10));
        }
        // Recency after these reads, oldest first: 2, 0, 3, 1.
        cache.get(&key(1, 0));
        cache.get(&key(1, 3));
        cache.get(&key(1, 1));
        cache.insert(key(1, 1), bytes(10));

        cache.insert(key(1, 4), bytes(10));
        assert!(!cache.contains(&key(1, 2)));
        cache.insert(key(1, 5), bytes(10));
        assert!(!cache.contains(&key(1, 0)));
        cache.insert(key(1, 6), bytes(20));
        assert!(!cache.contains(&key(1, 3)));
        assert!(!cache.contains(&key(1, 1)));

        let stats = cache.stats();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.bytes, 40);
        assert!(cache.contains(&key(1, 4)));
        assert!(cache.contains(&key(1, 5)));
        assert!(cache.contains(&key(1, 6)));
    }

    #[test]
    fn test_budget_never_exceeded() {
        let cache = TileCache::new(100);
        for x in 0..50 {
            cache.insert(key(1, x), bytes(7 + (x as usize % 13)));
            assert!(cache.stats().bytes <= 100);
        }
    }

    #[test]
    fn test_oversized_entry_not_stored() {
        let cache = TileCache::new(16);
        cache.insert(key(1, 0), bytes(8));
        assert!(!cache.insert(key(1, 1), bytes(17)));
        assert!(cache.contains(&key(1, 0)));
        assert!(!cache.contains(&key(1, 1)));
    }

    #[test]
    fn test_zero_budget_disables_cache() {
        let cache = TileCache::new(0);
        assert!(!cache.insert(key(1, 0), bytes(0)));
        assert!(cache.get(&key(1, 0)).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_replace_keeps_byte_count() {
        let cache = TileCache::new(100);
        cache.insert(key(1, 0), bytes(40));
        cache.insert(key(1, 0), bytes(20));
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.bytes, 20);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(TileCache::new(10_000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for x in 0..100 {
                        let k = key(1, x);
                        if cache.get(&k).is_none() {
                            cache.insert(k, bytes(10 + t));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = cache.stats();
        assert_eq!(stats.entries, 100);
        assert!(stats.bytes <= 10_000);
    }
}
