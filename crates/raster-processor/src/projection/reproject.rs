//! Re-gridding rasters onto a new pixel grid within their own CRS.

use raster_common::GeoTransform;

use super::{nearest_interpolate, output_len};
use crate::error::{RasterError, Result};
use crate::raster::Raster;

/// Resample one 2D plane from `src_gt` onto `dst_gt` with nearest neighbor.
///
/// Destination pixels whose centers fall outside the source grid, or land
/// on a source `nodata` value, are NaN.
///
/// # Arguments
/// * `data` - Source plane in row-major order (top-to-bottom)
/// * `src_width`, `src_height` - Source grid size
/// * `src_gt` - Source geotransform
/// * `nodata` - Source fill value to treat as missing
/// * `dst_width`, `dst_height` - Destination grid size
/// * `dst_gt` - Destination geotransform (same CRS as the source)
#[allow(clippy::too_many_arguments)]
pub fn reproject_plane(
    data: &[f32],
    src_width: usize,
    src_height: usize,
    src_gt: &GeoTransform,
    nodata: Option<f32>,
    dst_width: usize,
    dst_height: usize,
    dst_gt: &GeoTransform,
) -> Vec<f32> {
    let mut output = vec![f32::NAN; dst_width * dst_height];

    for out_y in 0..dst_height {
        for out_x in 0..dst_width {
            let (x, y) = dst_gt.pixel_center(out_x, out_y);
            let (col, row) = src_gt.coord_to_pixel(x, y);

            let value = nearest_interpolate(data, src_width, src_height, col, row);
            let missing = match nodata {
                Some(fill) if !fill.is_nan() => value == fill,
                _ => false,
            };
            if !missing {
                output[out_y * dst_width + out_x] = value;
            }
        }
    }

    output
}

/// Re-grid every plane of `raster` to `new_height` x `new_width` pixels over the same extent.
///
/// Non-spatial dimensions (date, band, ...) are carried through unchanged.
/// The output uses NaN as its nodata value.
pub fn reproject_to_shape(raster: &Raster, new_height: usize, new_width: usize) -> Result<Raster> {
    raster.check_spatial_layout()?;
    let src_gt = raster.geotransform()?;

    if new_width == 0 || new_height == 0 {
        return Err(RasterError::reprojection(format!(
            "target shape {}x{} has no pixels",
            new_height, new_width
        )));
    }

    let (width, height) = (raster.width(), raster.height());
    if width == 0 || height == 0 {
        return Err(RasterError::reprojection("source raster has no pixels"));
    }

    let len = output_len(raster.plane_count(), new_width, new_height).ok_or_else(|| {
        RasterError::reprojection(format!(
            "target shape {}x{} is too large to allocate",
            new_height, new_width
        ))
    })?;

    let dst_gt = src_gt.regrid(width, height, new_width, new_height);

    let mut data = Vec::with_capacity(len);
    for plane in raster.planes() {
        data.extend(reproject_plane(
            plane,
            width,
            height,
            &src_gt,
            raster.nodata(),
            new_width,
            new_height,
            &dst_gt,
        ));
    }

    let mut output = raster.with_spatial_grid(data, new_width, new_height, dst_gt);
    output.set_nodata(Some(f32::NAN));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimension, X_DIM, Y_DIM};

    fn two_by_two() -> Raster {
        Raster::spatial(
            vec![1.0, 2.0, 3.0, 4.0],
            2,
            2,
            GeoTransform::new(0.0, 1.0, 2.0, -1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_upsample_by_two_replicates_pixels() {
        let out = reproject_to_shape(&two_by_two(), 4, 4).unwrap();
        assert_eq!(out.shape(), vec![4, 4]);
        assert_eq!(
            out.data(),
            &[
                1.0, 1.0, 2.0, 2.0,
                1.0, 1.0, 2.0, 2.0,
                3.0, 3.0, 4.0, 4.0,
                3.0, 3.0, 4.0, 4.0,
            ]
        );
        let gt = out.transform().unwrap();
        assert_eq!(gt.resolution(), (0.5, 0.5));
        assert!(out.nodata().unwrap().is_nan());
    }

    #[test]
    fn test_oversized_target_is_reprojection_failure() {
        let result = reproject_to_shape(&two_by_two(), usize::MAX / 2, 4);
        assert!(matches!(result, Err(RasterError::ReprojectionFailure(_))));
    }

    #[test]
    fn test_nodata_becomes_nan() {
        let raster = two_by_two().with_nodata(2.0);
        let out = reproject_to_shape(&raster, 2, 2).unwrap();
        assert_eq!(out.data()[0], 1.0);
        assert!(out.data()[1].is_nan());
    }

    #[test]
    fn test_leading_dims_reprojected_per_plane() {
        let raster = Raster::new(
            vec![
                Dimension::new("date", vec!["2024-01-01".into(), "2024-01-02".into()]),
                Dimension::new(Y_DIM, vec![1.5.into(), 0.5.into()]),
                Dimension::new(X_DIM, vec![0.5.into(), 1.5.into()]),
            ],
            vec![1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0],
        )
        .unwrap();

        let out = reproject_to_shape(&raster, 4, 4).unwrap();
        assert_eq!(out.shape(), vec![2, 4, 4]);
        assert_eq!(out.data()[0], 1.0);
        assert_eq!(out.data()[16], 10.0);
        assert_eq!(out.data()[31], 40.0);
    }

    #[test]
    fn test_zero_shape_fails() {
        assert!(matches!(
            reproject_to_shape(&two_by_two(), 0, 4),
            Err(RasterError::ReprojectionFailure(_))
        ));
    }

    #[test]
    fn test_spatial_dims_must_trail() {
        let raster = Raster::new(
            vec![Dimension::indexed(X_DIM, 2), Dimension::indexed(Y_DIM, 2)],
            vec![0.0; 4],
        )
        .unwrap();
        assert!(matches!(
            reproject_to_shape(&raster, 4, 4),
            Err(RasterError::ReprojectionFailure(_))
        ));
    }
}
