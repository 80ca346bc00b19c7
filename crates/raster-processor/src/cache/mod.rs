//! Caching of opened rasters.

mod raster_cache;

pub use raster_cache::{CacheStats, RasterCache};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::raster::Raster;
use crate::source::RasterSource;

/// A [`RasterSource`] that keeps recently opened rasters in memory.
///
/// Dashboard requests re-open the same issue date many times while the
/// user switches region or display mode; each blob is read once.
pub struct CachedRasterSource<S> {
    inner: S,
    cache: Arc<RwLock<RasterCache>>,
}

impl<S: RasterSource> CachedRasterSource<S> {
    /// Wrap `inner` with a cache of `cache_size_mb` megabytes.
    pub fn new(inner: S, cache_size_mb: usize) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(RasterCache::new(cache_size_mb * 1024 * 1024))),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}

#[async_trait]
impl<S: RasterSource> RasterSource for CachedRasterSource<S> {
    async fn open(&self, blob_name: &str) -> Result<Raster> {
        if let Some(raster) = self.cache.write().await.get(blob_name) {
            debug!(blob = blob_name, "Raster cache hit");
            return Ok(raster.as_ref().clone());
        }

        let raster = self.inner.open(blob_name).await?;
        self.cache
            .write()
            .await
            .insert(blob_name, Arc::new(raster.clone()));
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RasterError;
    use crate::source::MemoryRasterSource;
    use crate::types::{Dimension, X_DIM, Y_DIM};

    #[tokio::test]
    async fn test_cached_source_reads_once() {
        let raster = Raster::new(
            vec![Dimension::indexed(Y_DIM, 2), Dimension::indexed(X_DIM, 2)],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let source = CachedRasterSource::new(
            MemoryRasterSource::new().with_raster("a.tif", raster.clone()),
            1,
        );

        assert_eq!(source.open("a.tif").await.unwrap(), raster);
        assert_eq!(source.open("a.tif").await.unwrap(), raster);

        let stats = source.cache_stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_cached_source_propagates_missing() {
        let source = CachedRasterSource::new(MemoryRasterSource::new(), 1);
        assert!(matches!(
            source.open("missing.tif").await,
            Err(RasterError::NotFound(_))
        ));
        assert_eq!(source.cache_stats().await.entries, 0);
    }
}
