//! Common geospatial types shared by the raster validation crates.

pub mod bbox;
pub mod crs;
pub mod geometry;
pub mod geotransform;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use geometry::Polygon;
pub use geotransform::GeoTransform;
pub use time::{IssueCadence, IssueCalendar};
