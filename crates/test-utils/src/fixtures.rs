//! Common test fixtures for the raster validation tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in the SEAS5 and Floodscan pipelines.

/// Common bounding box definitions for testing, as `(min_x, min_y, max_x, max_y)`.
pub mod bbox {
    /// A 1x1 degree box around a single admin-1 region
    pub const SMALL_REGION: (f64, f64, f64, f64) = (45.0, 2.0, 46.0, 3.0);

    /// Entirely outside Somalia
    pub const OCEAN: (f64, f64, f64, f64) = (60.0, -20.0, 61.0, -19.0);
}

/// Common grid specifications for testing.
pub mod grid {
    /// SEAS5 processed grid (0.4 degree resolution)
    pub const SEAS5: GridSpec = GridSpec {
        width: 27,
        height: 35,
        min_x: 40.8,
        max_x: 51.6,
        min_y: -2.0,
        max_y: 12.0,
    };

    /// Floodscan grid (300 arc-second, 1/12 degree resolution)
    pub const FLOODSCAN: GridSpec = GridSpec {
        width: 12,
        height: 12,
        min_x: 45.0,
        max_x: 46.0,
        min_y: 2.0,
        max_y: 3.0,
    };

    /// 10x10 grid at 0.25 degrees
    pub const SIMPLE_10X10: GridSpec = GridSpec {
        width: 10,
        height: 10,
        min_x: 0.0,
        max_x: 2.5,
        min_y: 0.0,
        max_y: 2.5,
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_x: f64,
        pub max_x: f64,
        pub min_y: f64,
        pub max_y: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the resolution in degrees.
        pub fn resolution(&self) -> (f64, f64) {
            let dx = (self.max_x - self.min_x) / self.width as f64;
            let dy = (self.max_y - self.min_y) / self.height as f64;
            (dx, dy)
        }

        /// Returns the bounding box as (min_x, min_y, max_x, max_y).
        pub fn bbox(&self) -> (f64, f64, f64, f64) {
            (self.min_x, self.min_y, self.max_x, self.max_y)
        }

        /// GDAL-style geotransform for a north-up grid.
        pub fn gdal_transform(&self) -> [f64; 6] {
            let (dx, dy) = self.resolution();
            [self.min_x, dx, 0.0, self.max_y, 0.0, -dy]
        }
    }
}

/// Common dates for testing.
pub mod time {
    /// A SEAS5 issue date
    pub const SEAS5_ISSUE: &str = "2024-03-01";

    /// A Floodscan valid date in the Gu rainy season
    pub const FLOODSCAN_DATE: &str = "2024-05-10";

    /// SEAS5 leadtimes published per issue
    pub const LEADTIMES: [i64; 7] = [0, 1, 2, 3, 4, 5, 6];
}

/// Common administrative region identifiers.
pub mod regions {
    pub const ISO3: &str = "som";
    pub const ADMIN_LEVEL: u8 = 1;
    pub const PCODE: &str = "SO11";
    pub const OTHER_PCODE: &str = "SO12";
}

/// GeoJSON builders for region fixtures.
pub mod geojson {
    use serde_json::{json, Map, Value};

    /// A Feature with a rectangular Polygon and one pcode property.
    pub fn bbox_feature(field: &str, pcode: &str, bbox: (f64, f64, f64, f64)) -> Value {
        let (min_x, min_y, max_x, max_y) = bbox;
        let mut properties = Map::new();
        properties.insert(field.to_string(), Value::from(pcode));
        json!({
            "type": "Feature",
            "properties": properties,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [min_x, min_y],
                    [max_x, min_y],
                    [max_x, max_y],
                    [min_x, max_y],
                    [min_x, min_y]
                ]]
            }
        })
    }

    /// A FeatureCollection from `(pcode, bbox)` pairs.
    pub fn feature_collection(field: &str, regions: &[(&str, (f64, f64, f64, f64))]) -> Value {
        let features: Vec<Value> = regions
            .iter()
            .map(|(pcode, bbox)| bbox_feature(field, pcode, *bbox))
            .collect();
        json!({ "type": "FeatureCollection", "features": features })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_size() {
        assert_eq!(grid::SIMPLE_10X10.size(), 100);
        assert_eq!(grid::FLOODSCAN.size(), 144);
    }

    #[test]
    fn test_grid_spec_resolution() {
        let (dx, dy) = grid::SIMPLE_10X10.resolution();
        assert!((dx - 0.25).abs() < 1e-12);
        assert!((dy - 0.25).abs() < 1e-12);

        let (dx, _) = grid::SEAS5.resolution();
        assert!((dx - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_feature_collection() {
        let fc = geojson::feature_collection("ADM1_PCODE", &[("SO11", bbox::SMALL_REGION)]);
        assert_eq!(fc["features"][0]["properties"]["ADM1_PCODE"], "SO11");
        assert_eq!(fc["features"][0]["geometry"]["coordinates"][0][2][0], 46.0);
    }
}
