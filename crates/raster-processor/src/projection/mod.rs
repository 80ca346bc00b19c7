//! Grid re-projection for rasters.
//!
//! Rasters are re-gridded within their own CRS: the extent is kept and the
//! pixel count changes, with each output pixel sampled from the input by
//! nearest neighbor.

pub mod interpolation;
pub mod reproject;

pub use interpolation::nearest_interpolate;
pub use reproject::{reproject_plane, reproject_to_shape};

/// Scaled sizes closer than this to a whole number snap to it.
const SNAP_EPSILON: f64 = 1e-9;

/// Output grid size for resampling `width` x `height` pixels by `factor`.
///
/// Returns `(new_width, new_height)`, truncating toward zero.
pub fn scaled_shape(width: usize, height: usize, factor: f64) -> (usize, usize) {
    let scale = |n: usize| {
        let scaled = n as f64 * factor;
        let nearest = scaled.round();
        let scaled = if (scaled - nearest).abs() < SNAP_EPSILON {
            nearest
        } else {
            scaled.floor()
        };
        if scaled.is_finite() && scaled > 0.0 {
            scaled as usize
        } else {
            0
        }
    };
    (scale(width), scale(height))
}

/// Number of values in `planes` grids of `width` x `height`, if they fit
/// in one allocation.
pub fn output_len(planes: usize, width: usize, height: usize) -> Option<usize> {
    let len = width.checked_mul(height)?.checked_mul(planes.max(1))?;
    let bytes = len.checked_mul(std::mem::size_of::<f32>())?;
    (bytes <= isize::MAX as usize).then_some(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_shape() {
        assert_eq!(scaled_shape(10, 10, 5.0), (50, 50));
        assert_eq!(scaled_shape(4, 3, 2.0), (8, 6));
        assert_eq!(scaled_shape(10, 7, 0.5), (5, 3));
    }

    #[test]
    fn test_scaled_shape_snaps_float_noise() {
        assert_eq!(scaled_shape(10, 10, 4.999_999_999_999_999), (50, 50));
        assert_eq!(scaled_shape(3, 3, 0.25 / 0.05), (15, 15));
    }

    #[test]
    fn test_scaled_shape_truncates_to_zero() {
        assert_eq!(scaled_shape(3, 3, 0.1), (0, 0));
        assert_eq!(scaled_shape(3, 3, f64::NAN), (0, 0));
    }

    #[test]
    fn test_output_len_limits() {
        assert_eq!(output_len(2, 4, 4), Some(32));
        assert_eq!(output_len(0, 4, 4), Some(16));
        assert_eq!(output_len(1, usize::MAX, 2), None);
        assert_eq!(output_len(2, 1 << 31, 1 << 31), None);
    }
}
