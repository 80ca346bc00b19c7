//! Raster and region sources.
//!
//! Production rasters live as cloud-optimized GeoTIFFs in blob storage and
//! regions come from COD-AB boundary files. The traits here let either be
//! swapped for local files or in-memory fixtures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use raster_common::Polygon;
use serde_json::Value;
use tracing::debug;

use crate::dataset::CodabLayer;
use crate::error::{RasterError, Result};
use crate::raster::Raster;

/// Source of rasters addressed by blob name.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Open the raster stored under `blob_name`.
    ///
    /// Returns [`RasterError::NotFound`] if no such blob exists.
    async fn open(&self, blob_name: &str) -> Result<Raster>;
}

/// Source of administrative region boundaries.
#[async_trait]
pub trait RegionSource: Send + Sync {
    /// Boundary of the region with `pcode` at `admin_level` in country `iso3`.
    async fn region(&self, iso3: &str, admin_level: u8, pcode: &str) -> Result<Polygon>;
}

/// Rasters stored as JSON files under a root directory.
///
/// A blob name maps to the same relative path with a `.json` extension,
/// so `seas5/.../precip_em_i2024-01-01_lt0.tif` is read from
/// `<root>/seas5/.../precip_em_i2024-01-01_lt0.json`.
#[derive(Debug, Clone)]
pub struct LocalRasterSource {
    root: PathBuf,
}

impl LocalRasterSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path backing `blob_name`.
    pub fn path_for(&self, blob_name: &str) -> PathBuf {
        self.root
            .join(blob_name.trim_start_matches('/'))
            .with_extension("json")
    }
}

#[async_trait]
impl RasterSource for LocalRasterSource {
    async fn open(&self, blob_name: &str) -> Result<Raster> {
        let path = self.path_for(blob_name);
        debug!(blob = blob_name, path = %path.display(), "Opening raster");

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RasterError::not_found(blob_name));
            }
            Err(e) => return Err(e.into()),
        };

        let raster: Raster = serde_json::from_str(&json)
            .map_err(|e| RasterError::source(format!("{}: {}", path.display(), e)))?;
        raster.validate()?;
        Ok(raster)
    }
}

/// Rasters held in memory, keyed by blob name.
#[derive(Debug, Clone, Default)]
pub struct MemoryRasterSource {
    rasters: HashMap<String, Raster>,
}

impl MemoryRasterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, blob_name: impl Into<String>, raster: Raster) {
        self.rasters.insert(blob_name.into(), raster);
    }

    pub fn with_raster(mut self, blob_name: impl Into<String>, raster: Raster) -> Self {
        self.insert(blob_name, raster);
        self
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}

#[async_trait]
impl RasterSource for MemoryRasterSource {
    async fn open(&self, blob_name: &str) -> Result<Raster> {
        self.rasters
            .get(blob_name)
            .cloned()
            .ok_or_else(|| RasterError::not_found(blob_name))
    }
}

/// Region boundaries read from GeoJSON exports of COD-AB layers.
///
/// Each admin level of a country is one FeatureCollection file named
/// `{iso3}_adm{level}.geojson`, with the pcode in `ADM{level}_PCODE`.
#[derive(Debug, Clone)]
pub struct LocalRegionSource {
    root: PathBuf,
}

impl LocalRegionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RegionSource for LocalRegionSource {
    async fn region(&self, iso3: &str, admin_level: u8, pcode: &str) -> Result<Polygon> {
        let layer = CodabLayer::new(iso3, admin_level);
        let path = self.root.join(layer.geojson_name());
        debug!(iso3, admin_level, pcode, path = %path.display(), "Loading region");

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RasterError::not_found(layer.shapefile()));
            }
            Err(e) => return Err(e.into()),
        };
        let collection: Value = serde_json::from_str(&json)?;

        find_region(&collection, &layer.pcode_field(), pcode)
    }
}

/// Polygon of the feature in `collection` whose `field` property equals `pcode`.
pub fn find_region(collection: &Value, field: &str, pcode: &str) -> Result<Polygon> {
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| RasterError::source("expected a GeoJSON FeatureCollection"))?;

    let feature = features
        .iter()
        .find(|f| f.pointer(&format!("/properties/{}", field)).and_then(Value::as_str) == Some(pcode))
        .ok_or_else(|| RasterError::not_found(format!("{} = {}", field, pcode)))?;

    Ok(Polygon::from_geojson(feature)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimension, X_DIM, Y_DIM};
    use serde_json::json;

    fn small_raster() -> Raster {
        Raster::new(
            vec![Dimension::indexed(Y_DIM, 1), Dimension::indexed(X_DIM, 2)],
            vec![1.0, 2.0],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemoryRasterSource::new().with_raster("a.tif", small_raster());
        assert_eq!(source.open("a.tif").await.unwrap(), small_raster());
        assert!(matches!(
            source.open("b.tif").await,
            Err(RasterError::NotFound(_))
        ));
    }

    #[test]
    fn test_local_path_mapping() {
        let source = LocalRasterSource::new("/data");
        assert_eq!(
            source.path_for("floodscan/daily/v5/processed/aer_area_300s_v2024-01-01_v05r01.tif"),
            PathBuf::from("/data/floodscan/daily/v5/processed/aer_area_300s_v2024-01-01_v05r01.json")
        );
    }

    #[test]
    fn test_find_region_by_pcode() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"ADM1_PCODE": "MZ01"},
                    "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"ADM1_PCODE": "MZ02"},
                    "geometry": {"type": "Polygon", "coordinates": [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]}
                }
            ]
        });

        let region = find_region(&collection, "ADM1_PCODE", "MZ02").unwrap();
        assert_eq!(region.bbox().min_x, 2.0);
        assert!(matches!(
            find_region(&collection, "ADM1_PCODE", "MZ99"),
            Err(RasterError::NotFound(_))
        ));
        assert!(find_region(&json!({"type": "Point"}), "ADM1_PCODE", "MZ01").is_err());
    }
}
