//! Affine geotransforms for north-up rasters.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Affine mapping from pixel indices to CRS coordinates.
///
/// Only axis-aligned transforms are representable. `origin_x`/`origin_y`
/// locate the outer corner of pixel (0, 0); `pixel_height` is negative for
/// rasters stored top-to-bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Pixel size along X (CRS units per column)
    pub pixel_width: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel size along Y (CRS units per row, usually negative)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a new geotransform.
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    /// Build from a GDAL-ordered six-coefficient array.
    ///
    /// Rotated or sheared transforms are rejected.
    pub fn from_gdal(coeffs: [f64; 6]) -> Result<Self, GeoTransformError> {
        if coeffs[2] != 0.0 || coeffs[4] != 0.0 {
            return Err(GeoTransformError::Rotated);
        }
        let transform = Self::new(coeffs[0], coeffs[1], coeffs[3], coeffs[5]);
        transform.validate()?;
        Ok(transform)
    }

    /// GDAL-ordered coefficients.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    /// North-up transform covering `bbox` with `width` x `height` pixels.
    pub fn from_bounds(bbox: &BoundingBox, width: usize, height: usize) -> Self {
        Self::new(
            bbox.min_x,
            bbox.width() / width as f64,
            bbox.max_y,
            -bbox.height() / height as f64,
        )
    }

    /// Check that the transform can be used to locate pixels.
    pub fn validate(&self) -> Result<(), GeoTransformError> {
        let coeffs = [
            self.origin_x,
            self.pixel_width,
            self.origin_y,
            self.pixel_height,
        ];
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(GeoTransformError::NonFinite(*self));
        }
        if self.pixel_width == 0.0 || self.pixel_height == 0.0 {
            return Err(GeoTransformError::ZeroPixelSize(*self));
        }
        Ok(())
    }

    /// Absolute pixel size (x, y).
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// Coordinates of the center of pixel (`col`, `row`).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional (col, row) position of a coordinate.
    pub fn coord_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Extent covered by a `width` x `height` raster.
    pub fn bbox(&self, width: usize, height: usize) -> BoundingBox {
        let far_x = self.origin_x + width as f64 * self.pixel_width;
        let far_y = self.origin_y + height as f64 * self.pixel_height;

        BoundingBox {
            min_x: self.origin_x.min(far_x),
            min_y: self.origin_y.min(far_y),
            max_x: self.origin_x.max(far_x),
            max_y: self.origin_y.max(far_y),
        }
    }

    /// Transform for the same extent re-gridded to `new_width` x `new_height`.
    pub fn regrid(
        &self,
        width: usize,
        height: usize,
        new_width: usize,
        new_height: usize,
    ) -> Self {
        Self::new(
            self.origin_x,
            self.pixel_width * width as f64 / new_width as f64,
            self.origin_y,
            self.pixel_height * height as f64 / new_height as f64,
        )
    }

    /// Transform of a window starting at pixel (`col_off`, `row_off`).
    pub fn window(&self, col_off: usize, row_off: usize) -> Self {
        Self::new(
            self.origin_x + col_off as f64 * self.pixel_width,
            self.pixel_width,
            self.origin_y + row_off as f64 * self.pixel_height,
            self.pixel_height,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeoTransformError {
    #[error("rotated or sheared geotransforms are not supported")]
    Rotated,

    #[error("geotransform has non-finite coefficients: {0:?}")]
    NonFinite(GeoTransform),

    #[error("geotransform has zero pixel size: {0:?}")]
    ZeroPixelSize(GeoTransform),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_degree() -> GeoTransform {
        // 0.25 degree grid with the upper-left corner at 30E, 5N
        GeoTransform::new(30.0, 0.25, 5.0, -0.25)
    }

    #[test]
    fn test_pixel_center() {
        let gt = quarter_degree();
        let (x, y) = gt.pixel_center(0, 0);
        assert!((x - 30.125).abs() < 1e-12);
        assert!((y - 4.875).abs() < 1e-12);

        let (col, row) = gt.coord_to_pixel(x, y);
        assert!((col - 0.5).abs() < 1e-12);
        assert!((row - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bbox() {
        let bbox = quarter_degree().bbox(10, 8);
        assert_eq!(bbox, BoundingBox::new(30.0, 3.0, 32.5, 5.0));
    }

    #[test]
    fn test_regrid_preserves_extent() {
        let gt = quarter_degree();
        let fine = gt.regrid(10, 10, 50, 50);
        assert!((fine.pixel_width - 0.05).abs() < 1e-12);
        assert!((fine.pixel_height + 0.05).abs() < 1e-12);
        let (a, b) = (gt.bbox(10, 10), fine.bbox(50, 50));
        assert!((a.max_x - b.max_x).abs() < 1e-9);
        assert!((a.min_y - b.min_y).abs() < 1e-9);
    }

    #[test]
    fn test_from_bounds_round_trip() {
        let bbox = BoundingBox::new(-10.0, -5.0, 10.0, 5.0);
        let gt = GeoTransform::from_bounds(&bbox, 40, 20);
        assert_eq!(gt.resolution(), (0.5, 0.5));
        assert_eq!(gt.bbox(40, 20), bbox);
    }

    #[test]
    fn test_validate_rejects_corrupt() {
        assert!(matches!(
            GeoTransform::new(0.0, 0.0, 0.0, -1.0).validate(),
            Err(GeoTransformError::ZeroPixelSize(_))
        ));
        assert!(matches!(
            GeoTransform::new(f64::NAN, 1.0, 0.0, -1.0).validate(),
            Err(GeoTransformError::NonFinite(_))
        ));
        assert!(quarter_degree().validate().is_ok());
    }

    #[test]
    fn test_from_gdal() {
        let gt = GeoTransform::from_gdal([30.0, 0.25, 0.0, 5.0, 0.0, -0.25]).unwrap();
        assert_eq!(gt, quarter_degree());
        assert_eq!(gt.to_gdal(), [30.0, 0.25, 0.0, 5.0, 0.0, -0.25]);

        assert!(matches!(
            GeoTransform::from_gdal([30.0, 0.25, 0.1, 5.0, 0.0, -0.25]),
            Err(GeoTransformError::Rotated)
        ));
    }
}
