//! Error types for raster processing.

use thiserror::Error;

/// Errors that can occur while building, clipping, or resampling rasters.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Required axes are missing from the raster.
    #[error("raster missing required dimensions: {missing:?}")]
    InvalidRasterShape { missing: Vec<String> },

    /// The geometric transform could not be computed or applied.
    #[error("reprojection failed: {0}")]
    ReprojectionFailure(String),

    /// Target resolution is not a positive finite number.
    #[error("invalid target resolution: {0}")]
    InvalidResolution(f64),

    /// Data and dimensions do not describe a consistent raster.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// No raster pixels fall inside the requested region.
    #[error("no data in bounds: {0}")]
    NoDataInBounds(String),

    /// Band name not present in the band table.
    #[error("unknown band: {0}")]
    UnknownBand(String),

    /// Dataset has no issue-date calendar.
    #[error("no date range configured for dataset: {0}")]
    NoDateRange(String),

    /// Unknown dataset identifier.
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    /// Requested blob or region does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Raster or region retrieval failed.
    #[error("source error: {0}")]
    Source(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl RasterError {
    /// Create an InvalidRasterShape error.
    pub fn invalid_shape<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut missing: Vec<String> = missing.into_iter().map(Into::into).collect();
        missing.sort();
        Self::InvalidRasterShape { missing }
    }

    /// Create a ReprojectionFailure error.
    pub fn reprojection(msg: impl Into<String>) -> Self {
        Self::ReprojectionFailure(msg.into())
    }

    /// Create an InvalidRaster error.
    pub fn invalid_raster(msg: impl Into<String>) -> Self {
        Self::InvalidRaster(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a Source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Source(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Source(err.to_string())
    }
}

impl From<raster_common::geotransform::GeoTransformError> for RasterError {
    fn from(err: raster_common::geotransform::GeoTransformError) -> Self {
        Self::ReprojectionFailure(err.to_string())
    }
}

impl From<raster_common::geometry::GeometryError> for RasterError {
    fn from(err: raster_common::geometry::GeometryError) -> Self {
        Self::Source(err.to_string())
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
