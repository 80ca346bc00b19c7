//! Memory-bounded LRU cache of opened rasters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;

use crate::raster::Raster;

/// Statistics about the raster cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub memory_bytes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of rasters keyed by blob name, evicting by pixel memory.
pub struct RasterCache {
    cache: LruCache<String, Arc<Raster>>,
    memory_limit: usize,
    current_memory: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl RasterCache {
    /// Create a cache holding at most `memory_limit` bytes of pixel data.
    pub fn new(memory_limit: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            memory_limit,
            current_memory: 0,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a raster, marking it most recently used.
    pub fn get(&mut self, blob_name: &str) -> Option<Arc<Raster>> {
        match self.cache.get(blob_name) {
            Some(raster) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(raster))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn contains(&self, blob_name: &str) -> bool {
        self.cache.contains(blob_name)
    }

    /// Insert a raster, evicting least recently used entries to make room.
    ///
    /// Rasters larger than the whole budget are not cached.
    pub fn insert(&mut self, blob_name: impl Into<String>, raster: Arc<Raster>) {
        let size = raster_bytes(&raster);
        if size > self.memory_limit {
            return;
        }

        let blob_name = blob_name.into();
        if let Some(previous) = self.cache.pop(&blob_name) {
            self.current_memory = self.current_memory.saturating_sub(raster_bytes(&previous));
        }

        while self.current_memory + size > self.memory_limit {
            match self.cache.pop_lru() {
                Some((_, evicted)) => {
                    self.current_memory = self.current_memory.saturating_sub(raster_bytes(&evicted));
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }

        self.cache.put(blob_name, raster);
        self.current_memory += size;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.len(),
            memory_bytes: self.current_memory as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.current_memory = 0;
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn raster_bytes(raster: &Raster) -> usize {
    std::mem::size_of_val(raster.data())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimension, X_DIM, Y_DIM};

    fn raster(width: usize, value: f32) -> Arc<Raster> {
        Arc::new(
            Raster::new(
                vec![Dimension::indexed(Y_DIM, 1), Dimension::indexed(X_DIM, width)],
                vec![value; width],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = RasterCache::new(1024);
        assert!(cache.get("a").is_none());

        cache.insert("a", raster(4, 1.0));
        assert_eq!(cache.get("a").unwrap().data(), &[1.0; 4]);
        assert_eq!(cache.memory_usage(), 16);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_lru_eviction() {
        // Room for four 16-byte rasters
        let mut cache = RasterCache::new(64);
        for i in 0..10 {
            cache.insert(format!("blob-{}", i), raster(4, i as f32));
        }

        assert!(cache.get("blob-0").is_none());
        assert!(cache.get("blob-9").is_some());
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.stats().evictions, 6);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut cache = RasterCache::new(64);
        cache.insert("a", raster(4, 1.0));
        cache.insert("a", raster(4, 2.0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.memory_usage(), 16);
        assert_eq!(cache.get("a").unwrap().data()[0], 2.0);
    }

    #[test]
    fn test_oversized_not_cached() {
        let mut cache = RasterCache::new(8);
        cache.insert("big", raster(4, 0.0));
        assert!(cache.is_empty());
    }
}
