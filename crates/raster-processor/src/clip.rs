//! Clipping rasters to administrative regions.

use raster_common::{GeoTransform, Polygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RasterError, Result};
use crate::raster::Raster;

/// Options for [`clip_to_region`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipOptions {
    /// Keep every pixel the region touches, not only those whose center
    /// lies inside it.
    #[serde(default)]
    pub all_touched: bool,
}

impl ClipOptions {
    pub fn all_touched() -> Self {
        Self { all_touched: true }
    }
}

/// Crop `raster` to the window covering `region` and mask pixels outside it to NaN.
///
/// The region must be in the raster's CRS. Non-spatial dimensions are kept.
///
/// # Errors
/// * [`RasterError::ReprojectionFailure`] if the raster has no usable geotransform
/// * [`RasterError::NoDataInBounds`] if the region misses the raster, or
///   selects no pixel
pub fn clip_to_region(raster: &Raster, region: &Polygon, options: ClipOptions) -> Result<Raster> {
    raster.check_spatial_layout()?;
    let transform = raster.geotransform()?;
    let (width, height) = (raster.width(), raster.height());

    if region.is_empty() {
        return Err(RasterError::NoDataInBounds("region has no vertices".to_string()));
    }

    let region_bbox = region.bbox();
    let overlap = transform
        .bbox(width, height)
        .intersection(&region_bbox)
        .ok_or_else(|| {
            RasterError::NoDataInBounds(format!(
                "region {:?} does not overlap raster extent",
                region_bbox
            ))
        })?;

    let (col_off, row_off, win_width, win_height) = pixel_window(&transform, width, height, &overlap)
        .ok_or_else(|| {
            RasterError::NoDataInBounds("region covers no whole pixel window".to_string())
        })?;
    let window = transform.window(col_off, row_off);

    let mask = selection_mask(&window, win_width, win_height, region, options);
    let selected = mask.iter().filter(|&&m| m).count();
    debug!(
        col_off,
        row_off,
        win_width,
        win_height,
        selected,
        all_touched = options.all_touched,
        "Clipping raster to region"
    );
    if selected == 0 {
        return Err(RasterError::NoDataInBounds(
            "no pixel falls inside the region".to_string(),
        ));
    }

    let mut data = Vec::with_capacity(raster.plane_count() * win_width * win_height);
    for plane in raster.planes() {
        for row in 0..win_height {
            let start = (row_off + row) * width + col_off;
            let src_row = &plane[start..start + win_width];
            let mask_row = &mask[row * win_width..(row + 1) * win_width];
            data.extend(
                src_row
                    .iter()
                    .zip(mask_row)
                    .map(|(&v, &keep)| if keep { v } else { f32::NAN }),
            );
        }
    }

    let mut clipped = raster.with_spatial_grid(data, win_width, win_height, window);
    if raster.nodata().is_none() {
        clipped.set_nodata(Some(f32::NAN));
    }
    Ok(clipped)
}

/// Pixel window `(col_off, row_off, width, height)` covering `bbox`.
fn pixel_window(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    bbox: &raster_common::BoundingBox,
) -> Option<(usize, usize, usize, usize)> {
    let (c0, r0) = transform.coord_to_pixel(bbox.min_x, bbox.min_y);
    let (c1, r1) = transform.coord_to_pixel(bbox.max_x, bbox.max_y);

    let clamp = |v: f64, max: usize| v.max(0.0).min(max as f64) as usize;
    let col_start = clamp(c0.min(c1).floor(), width);
    let col_end = clamp(c0.max(c1).ceil(), width);
    let row_start = clamp(r0.min(r1).floor(), height);
    let row_end = clamp(r0.max(r1).ceil(), height);

    if col_end <= col_start || row_end <= row_start {
        return None;
    }
    Some((col_start, row_start, col_end - col_start, row_end - row_start))
}

fn selection_mask(
    window: &GeoTransform,
    width: usize,
    height: usize,
    region: &Polygon,
    options: ClipOptions,
) -> Vec<bool> {
    let mut mask = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let keep = if options.all_touched {
                region.touches_rect(&window.window(col, row).bbox(1, 1))
            } else {
                let (x, y) = window.pixel_center(col, row);
                region.contains_point(x, y)
            };
            mask.push(keep);
        }
    }
    mask
}
