//! Raster resampling for the SEAS5 and Floodscan validation dashboard.
//!
//! Rasters are labeled N-dimensional grids: two spatial axes (`y`, `x`),
//! usually a `date` axis, and at most one further axis such as a
//! Floodscan `band` or a SEAS5 leadtime `lt`. The central operation,
//! [`upsample_raster`], re-grids a raster to a finer resolution over the
//! same extent with nearest-neighbor sampling, handling the further axis
//! one slice at a time.
//!
//! # Architecture
//!
//! ```text
//! CogRequest
//!      │
//!      ▼
//! CogView::prepare
//!      │
//!      ├─► RegionSource::region(iso3, level, pcode) ──► Polygon
//!      │
//!      ├─► open_seas5_rasters / open_floodscan_rasters
//!      │         │
//!      │         └─► RasterSource::open(blob) (optionally cached)
//!      │
//!      ├─► clip_to_region(all_touched) ──► Resampler::upsample
//!      │
//!      └─► clip_to_region ──► sel(date)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use raster_processor::{upsample_raster, Raster};
//!
//! let raster: Raster = serde_json::from_str(&json)?;
//! let fine = upsample_raster(&raster, 0.05)?;
//! assert_eq!(fine.dim_names(), raster.dim_names());
//! ```

pub mod cache;
pub mod clip;
pub mod config;
pub mod dataset;
pub mod error;
pub mod projection;
pub mod raster;
pub mod resample;
pub mod source;
pub mod stats;
pub mod types;
pub mod view;

// Re-export commonly used types at crate root
pub use cache::{CacheStats, CachedRasterSource, RasterCache};
pub use clip::{clip_to_region, ClipOptions};
pub use config::{AxisRelabel, ResampleConfig};
pub use dataset::{
    floodscan_blob_name, open_floodscan_rasters, open_seas5_rasters, seas5_blob_name, CodabLayer,
    Dataset, FloodscanBand,
};
pub use error::{RasterError, Result};
pub use projection::{nearest_interpolate, reproject_to_shape};
pub use raster::Raster;
pub use resample::{upsample_raster, validate_dimensions, Resampler};
pub use source::{
    LocalRasterSource, LocalRegionSource, MemoryRasterSource, RasterSource, RegionSource,
};
pub use types::{AttrPolicy, CoordValue, Dimension, DATE_DIM, X_DIM, Y_DIM};
pub use view::{CogRequest, CogView, DisplayMode};

pub use raster_common::{BoundingBox, CrsCode, GeoTransform, Polygon};
